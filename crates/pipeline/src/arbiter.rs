//! Cross-channel winner-take-all arbitration.

use emg_types::{DominantState, GestureLabel};

/// Picks the winning gesture label across all channels.
///
/// The dominant state with the strictly highest hit count wins. Ties go to
/// the lowest channel index: the caller passes dominants in channel order and
/// only a strictly greater count displaces the current winner.
pub fn arbitrate(dominants: &[DominantState]) -> Option<GestureLabel> {
    let mut winner: Option<&DominantState> = None;
    for candidate in dominants {
        match winner {
            Some(current) if candidate.hits <= current.hits => {}
            _ => winner = Some(candidate),
        }
    }
    winner.map(|state| state.label.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dominant(channel: usize, label: &str, hits: u64) -> DominantState {
        DominantState {
            channel,
            label: label.into(),
            hits,
        }
    }

    #[test]
    fn highest_hit_count_wins() {
        let dominants = [dominant(0, "Extension", 3), dominant(1, "Flexion", 7)];
        assert_eq!(arbitrate(&dominants), Some("Flexion".into()));
    }

    #[test]
    fn ties_go_to_the_lowest_channel() {
        let dominants = [dominant(0, "Flexion", 10), dominant(1, "Extension", 10)];
        assert_eq!(arbitrate(&dominants), Some("Flexion".into()));
    }

    #[test]
    fn empty_input_yields_no_winner() {
        assert_eq!(arbitrate(&[]), None);
    }

    #[test]
    fn single_channel_wins_by_default() {
        assert_eq!(
            arbitrate(&[dominant(1, "Extension", 0)]),
            Some("Extension".into())
        );
    }
}
