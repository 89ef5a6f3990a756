use crate::model::Task;

/// Outcome of validating a candidate task against the current schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapCheck<'a> {
    Accepted,
    Rejected { conflicting: &'a Task },
}

impl OverlapCheck<'_> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, OverlapCheck::Accepted)
    }
}

/// Returns the first existing task, in iteration order, whose interval
/// intersects the candidate's.
///
/// Unscheduled tasks never conflict, on either side. An existing task that
/// shares the candidate's id is its previous version and is skipped.
pub fn check_overlap<'a>(candidate: &Task, existing: &'a [Task]) -> OverlapCheck<'a> {
    let Some(interval) = candidate.interval else {
        return OverlapCheck::Accepted;
    };
    existing
        .iter()
        .filter(|task| task.id != candidate.id)
        .find(|task| task.interval.is_some_and(|other| interval.overlaps(&other)))
        .map_or(OverlapCheck::Accepted, |conflicting| OverlapCheck::Rejected {
            conflicting,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, start: u32, duration: u32) -> Task {
        Task::new(id, format!("task {id}"), start, duration, vec![])
    }

    #[test]
    fn rejects_start_inside_existing_task() {
        let existing = vec![task("a", 540, 60)];
        let candidate = task("b", 570, 30);
        assert_eq!(
            check_overlap(&candidate, &existing),
            OverlapCheck::Rejected {
                conflicting: &existing[0]
            }
        );
    }

    #[test]
    fn accepts_touching_boundary() {
        let existing = vec![task("a", 540, 60)];
        assert!(check_overlap(&task("b", 600, 30), &existing).is_accepted());
        assert!(check_overlap(&task("c", 510, 30), &existing).is_accepted());
    }

    #[test]
    fn containment_detected_in_both_directions() {
        let outer = vec![task("outer", 100, 100)];
        let inner = vec![task("inner", 120, 20)];
        assert!(!check_overlap(&inner[0], &outer).is_accepted());
        assert!(!check_overlap(&outer[0], &inner).is_accepted());
    }

    #[test]
    fn first_conflict_in_insertion_order_wins() {
        let existing = vec![task("late", 600, 60), task("early", 480, 180)];
        match check_overlap(&task("c", 610, 10), &existing) {
            OverlapCheck::Rejected { conflicting } => assert_eq!(conflicting.id, "late"),
            OverlapCheck::Accepted => panic!("expected a conflict"),
        }
    }

    #[test]
    fn unscheduled_tasks_never_block() {
        let existing = vec![Task::unscheduled("u", "someday", vec![]), task("a", 540, 60)];
        let candidate = Task::unscheduled("v", "later", vec![]);
        assert!(check_overlap(&candidate, &existing).is_accepted());
        assert!(check_overlap(&task("b", 700, 30), &existing).is_accepted());
    }

    #[test]
    fn edited_task_does_not_conflict_with_itself() {
        let existing = vec![task("a", 540, 60)];
        assert!(check_overlap(&task("a", 550, 60), &existing).is_accepted());
    }
}
