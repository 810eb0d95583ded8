use serde::Serialize;

/// Named signals a presentation layer may map to sound effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Cue {
    /// One second elapsed.
    Tick,
    /// One second elapsed and the remaining time is at or under the fast threshold.
    TickFast,
    /// The pool was cleared and a faster round began.
    RoundAdvance,
    /// The timed phase ended.
    SessionEnd,
}

impl Cue {
    /// Cue for a tick leaving `remaining_secs` on the clock.
    pub fn for_tick(remaining_secs: u32, fast_threshold_secs: u32) -> Self {
        if remaining_secs <= fast_threshold_secs {
            Cue::TickFast
        } else {
            Cue::Tick
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_names_match_sink_vocabulary() {
        let names: Vec<String> = [Cue::Tick, Cue::TickFast, Cue::RoundAdvance, Cue::SessionEnd]
            .iter()
            .map(|cue| serde_json::to_string(cue).unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "\"tick\"",
                "\"tickFast\"",
                "\"roundAdvance\"",
                "\"sessionEnd\""
            ]
        );
    }

    #[test]
    fn fast_tick_starts_at_threshold() {
        assert_eq!(Cue::for_tick(6, 5), Cue::Tick);
        assert_eq!(Cue::for_tick(5, 5), Cue::TickFast);
        assert_eq!(Cue::for_tick(1, 5), Cue::TickFast);
    }
}
