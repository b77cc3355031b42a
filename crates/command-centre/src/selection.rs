//! Selection resolution across refresh cycles.
//!
//! The feeder list is rebuilt wholesale on every poll tick, so the selected
//! feeder is re-resolved against each new list by id rather than held as an
//! object reference.

use api_types::FeederSummary;

/// Resolve the desired selection against the freshest list.
///
/// Precedence: an explicit external request (deep link) when its id exists
/// in the list, then the previously selected id when it survived the
/// refresh, then the first entry, then nothing on an empty list. The
/// returned value is the *new* list's entry, never a stale object.
pub fn resolve_selection(
    list: &[FeederSummary],
    requested: Option<&str>,
    previous: Option<&str>,
) -> Option<FeederSummary> {
    if list.is_empty() {
        return None;
    }

    if let Some(id) = requested {
        if let Some(feeder) = list.iter().find(|f| f.id == id) {
            return Some(feeder.clone());
        }
    }

    if let Some(id) = previous {
        if let Some(feeder) = list.iter().find(|f| f.id == id) {
            return Some(feeder.clone());
        }
    }

    list.first().cloned()
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    fn feeder(id: &str, load_kw: f64) -> FeederSummary {
        FeederSummary {
            id: id.into(),
            name: format!("Feeder {id}"),
            state: 0,
            load_kw,
            temperature: None,
        }
    }

    #[test]
    fn previous_selection_survives_a_refresh_by_value() {
        let refreshed = vec![feeder("F11", 100.0), feeder("F12", 250.0)];

        let resolved = resolve_selection(&refreshed, None, Some("F12"))
            .expect("F12 is still in the list");
        assert_eq!(resolved.id, "F12");
        assert_eq!(
            resolved.load_kw, 250.0,
            "the resolved entry is the refreshed one, not the prior object"
        );
    }

    #[test]
    fn vanished_selection_falls_back_to_the_first_entry() {
        let refreshed = vec![feeder("F1", 100.0), feeder("F2", 200.0)];

        let resolved = resolve_selection(&refreshed, None, Some("F99"))
            .expect("non-empty list always resolves");
        assert_eq!(resolved.id, "F1");
    }

    #[test]
    fn deep_link_request_wins_over_previous_selection() {
        let refreshed = vec![feeder("F1", 100.0), feeder("F2", 200.0), feeder("F3", 300.0)];

        let resolved = resolve_selection(&refreshed, Some("F3"), Some("F2"))
            .expect("requested id is present");
        assert_eq!(resolved.id, "F3");
    }

    #[test]
    fn unsatisfiable_request_falls_through_to_previous() {
        let refreshed = vec![feeder("F1", 100.0), feeder("F2", 200.0)];

        let resolved = resolve_selection(&refreshed, Some("F77"), Some("F2"))
            .expect("previous id is present");
        assert_eq!(resolved.id, "F2");
    }

    #[test]
    fn empty_list_resolves_to_nothing() {
        assert_eq!(resolve_selection(&[], Some("F1"), Some("F2")), None);
    }
}
