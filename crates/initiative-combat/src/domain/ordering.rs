//! Turn order: a pure function of participant state.
//!
//! Keys, in priority order:
//! 1. initiative descending, missing initiative last;
//! 2. missing initiative: display name ascending;
//! 3. equal initiative: `manual_order` ascending, then category precedence
//!    (player, npc, monster, other), then display name ascending;
//! 4. insertion order, so the result is a total order.

use std::cmp::Ordering;

use super::initiative::Initiative;
use super::participant::Participant;

/// Compares two participants by turn priority. `Less` goes first.
#[must_use]
pub fn compare(a: &Participant, b: &Participant) -> Ordering {
    let primary = match (a.initiative, b.initiative) {
        (Some(left), Some(right)) => right
            .cmp(&left)
            .then(a.manual_order.cmp(&b.manual_order))
            .then(a.category.cmp(&b.category))
            .then_with(|| compare_names(&a.display_name, &b.display_name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare_names(&a.display_name, &b.display_name),
    };
    primary.then(a.insertion_order.cmp(&b.insertion_order))
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Participants sorted into turn order.
#[must_use]
pub fn turn_order(participants: &[Participant]) -> Vec<&Participant> {
    let mut ordered: Vec<&Participant> = participants.iter().collect();
    ordered.sort_by(|a, b| compare(a, b));
    ordered
}

/// All participants sharing `initiative`, in turn order.
#[must_use]
pub fn tie_group(initiative: Initiative, participants: &[Participant]) -> Vec<&Participant> {
    turn_order(participants)
        .into_iter()
        .filter(|p| p.initiative == Some(initiative))
        .collect()
}

/// A tie needs manual resolution when two or more participants share an
/// initiative value and at least one of them is a player.
#[must_use]
pub fn is_tied(participant: &Participant, participants: &[Participant]) -> bool {
    let Some(initiative) = participant.initiative else {
        return false;
    };
    let group = tie_group(initiative, participants);
    group.len() > 1 && group.iter().any(|p| p.category.is_player())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use initiative_core::library::ActorCategory;
    use uuid::Uuid;

    use super::*;

    fn participant(
        name: &str,
        category: ActorCategory,
        initiative: Option<Initiative>,
        insertion_order: u64,
    ) -> Participant {
        Participant {
            id: Uuid::new_v4(),
            actor_id: Uuid::new_v4(),
            category,
            base_name: name.to_owned(),
            instance_number: 1,
            display_name: name.to_owned(),
            initiative,
            initiative_modifier: 0,
            has_acted: false,
            manual_order: 0,
            conditions: BTreeMap::new(),
            insertion_order,
        }
    }

    fn whole(value: i32) -> Option<Initiative> {
        Some(Initiative::from_whole(value))
    }

    fn exact(ten_thousandths: i64) -> Option<Initiative> {
        Some(Initiative::from_ten_thousandths(ten_thousandths))
    }

    fn names(ordered: &[&Participant]) -> Vec<String> {
        ordered.iter().map(|p| p.display_name.clone()).collect()
    }

    #[test]
    fn test_higher_initiative_goes_first() {
        let participants = vec![
            participant("Ogre", ActorCategory::Monster, whole(8), 0),
            participant("Ada", ActorCategory::Player, whole(17), 1),
            participant("Bandit", ActorCategory::Npc, exact(119_000), 2),
        ];

        assert_eq!(
            names(&turn_order(&participants)),
            vec!["Ada", "Bandit", "Ogre"]
        );
    }

    #[test]
    fn test_missing_initiative_sorts_last_alphabetically() {
        let participants = vec![
            participant("zombie", ActorCategory::Monster, None, 0),
            participant("Wolf", ActorCategory::Monster, whole(2), 1),
            participant("Archer", ActorCategory::Npc, None, 2),
            participant("brute", ActorCategory::Monster, None, 3),
        ];

        assert_eq!(
            names(&turn_order(&participants)),
            vec!["Wolf", "Archer", "brute", "zombie"]
        );
    }

    #[test]
    fn test_manual_order_breaks_ties_before_category() {
        let fifteen = whole(15);
        let mut ada = participant("Ada", ActorCategory::Player, fifteen, 0);
        let mut orc = participant("Orc", ActorCategory::Monster, fifteen, 1);
        ada.manual_order = 1;
        orc.manual_order = 0;
        let participants = vec![ada, orc];

        assert_eq!(names(&turn_order(&participants)), vec!["Orc", "Ada"]);
    }

    #[test]
    fn test_unresolved_tie_falls_back_to_category_then_name() {
        let participants = vec![
            participant("Orc", ActorCategory::Monster, whole(15), 0),
            participant("Zed", ActorCategory::Player, whole(15), 1),
            participant("Bea", ActorCategory::Player, whole(15), 2),
            participant("Guard", ActorCategory::Npc, whole(15), 3),
        ];

        assert_eq!(
            names(&turn_order(&participants)),
            vec!["Bea", "Zed", "Guard", "Orc"]
        );
    }

    #[test]
    fn test_sorting_is_idempotent() {
        let participants = vec![
            participant("C", ActorCategory::Player, whole(10), 0),
            participant("B", ActorCategory::Player, whole(10), 1),
            participant("A", ActorCategory::Other, None, 2),
            participant("D", ActorCategory::Npc, whole(12), 3),
        ];

        let first: Vec<Uuid> = turn_order(&participants).iter().map(|p| p.id).collect();
        let second: Vec<Uuid> = turn_order(&participants).iter().map(|p| p.id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_identical_keys_fall_back_to_insertion_order() {
        let participants = vec![
            participant("Twin", ActorCategory::Player, whole(9), 5),
            participant("Twin", ActorCategory::Player, whole(9), 2),
        ];

        let ordered = turn_order(&participants);
        assert_eq!(ordered[0].insertion_order, 2);
        assert_eq!(ordered[1].insertion_order, 5);
    }

    #[test]
    fn test_player_tie_is_flagged() {
        let participants = vec![
            participant("Ada", ActorCategory::Player, whole(15), 0),
            participant("Bea", ActorCategory::Player, whole(15), 1),
            participant("Orc", ActorCategory::Monster, whole(11), 2),
        ];

        assert!(is_tied(&participants[0], &participants));
        assert!(is_tied(&participants[1], &participants));
        assert!(!is_tied(&participants[2], &participants));
    }

    #[test]
    fn test_player_and_monster_on_same_integer_are_tied() {
        let participants = vec![
            participant("Ada", ActorCategory::Player, whole(15), 0),
            participant("Orc", ActorCategory::Monster, whole(15), 1),
        ];

        assert!(is_tied(&participants[0], &participants));
        assert!(is_tied(&participants[1], &participants));
    }

    #[test]
    fn test_non_player_only_tie_is_not_flagged() {
        let participants = vec![
            participant("Orc", ActorCategory::Monster, whole(15), 0),
            participant("Guard", ActorCategory::Npc, whole(15), 1),
        ];

        assert!(!is_tied(&participants[0], &participants));
    }

    #[test]
    fn test_missing_initiative_is_never_tied() {
        let participants = vec![
            participant("Ada", ActorCategory::Player, None, 0),
            participant("Bea", ActorCategory::Player, None, 1),
        ];

        assert!(!is_tied(&participants[0], &participants));
    }
}
