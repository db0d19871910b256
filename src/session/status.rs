/// Derived disposition of one question, shown in the palette grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuestionStatus {
    NotVisited,
    Visited,
    Marked,
    Answered,
    AnsweredMarked,
}

impl QuestionStatus {
    /// Derive the status from the three session flags. Answered-and-marked
    /// outranks both single flags; a bare visit ranks last before not-visited.
    /// Always recomputed at the call site; the flags mutate between renders.
    pub fn resolve(answered: bool, marked: bool, visited: bool) -> Self {
        match (answered, marked) {
            (true, true) => QuestionStatus::AnsweredMarked,
            (true, false) => QuestionStatus::Answered,
            (false, true) => QuestionStatus::Marked,
            (false, false) if visited => QuestionStatus::Visited,
            (false, false) => QuestionStatus::NotVisited,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuestionStatus::NotVisited => "not visited",
            QuestionStatus::Visited => "visited",
            QuestionStatus::Marked => "marked",
            QuestionStatus::Answered => "answered",
            QuestionStatus::AnsweredMarked => "answered+marked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_covers_every_flag_combination() {
        let cases = [
            (false, false, false, QuestionStatus::NotVisited),
            (false, false, true, QuestionStatus::Visited),
            (false, true, false, QuestionStatus::Marked),
            (false, true, true, QuestionStatus::Marked),
            (true, false, false, QuestionStatus::Answered),
            (true, false, true, QuestionStatus::Answered),
            (true, true, false, QuestionStatus::AnsweredMarked),
            (true, true, true, QuestionStatus::AnsweredMarked),
        ];
        for (answered, marked, visited, expected) in cases {
            assert_eq!(
                QuestionStatus::resolve(answered, marked, visited),
                expected,
                "answered={answered} marked={marked} visited={visited}"
            );
        }
    }

    #[test]
    fn test_answered_and_marked_never_collapses_to_marked() {
        assert_ne!(
            QuestionStatus::resolve(true, true, true),
            QuestionStatus::Marked
        );
    }
}
