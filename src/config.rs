//! Application-level configuration loading, including game tuning and the collocation bank.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};
use tracing::{info, warn};

use crate::state::{clock::ClockSchedule, content::Collocation, session::GameTuning};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "COLLOCATION_DASH_CONFIG_PATH";
const DEFAULT_REVIEW_FEEDBACK_DELAY: Duration = Duration::from_millis(1_500);
const DEFAULT_LEADERBOARD_SIZE: usize = 10;
const DEFAULT_PERSONAL_BEST_COUNT: usize = 5;
const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
/// Upper bound of any ranking read.
const MAX_RANKING_SIZE: usize = 100;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Gameplay knobs handed to every new session.
    pub tuning: GameTuning,
    /// How long review feedback stays on screen before auto-advancing; zero disables it.
    pub review_feedback_delay: Duration,
    /// Rows returned by the leaderboard and broadcast after each recorded score.
    pub leaderboard_size: usize,
    /// Personal bests returned by default.
    pub personal_best_count: usize,
    /// Sessions without player activity for this long are evicted; zero keeps them forever.
    pub session_ttl: Duration,
    /// The content bank rounds are drawn from.
    pub collocations: Vec<Collocation>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        collocations = app_config.collocations.len(),
                        round_size = app_config.tuning.round_size,
                        "loaded game config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tuning: GameTuning::default(),
            review_feedback_delay: DEFAULT_REVIEW_FEEDBACK_DELAY,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            personal_best_count: DEFAULT_PERSONAL_BEST_COUNT,
            session_ttl: DEFAULT_SESSION_TTL,
            collocations: default_collocations(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    game: RawGameConfig,
    collocations: Option<Vec<RawCollocation>>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(default)]
/// The `game` section; every key is optional.
struct RawGameConfig {
    round_size: usize,
    initial_duration_secs: u32,
    minimum_duration_secs: u32,
    duration_step_secs: u32,
    fast_threshold_secs: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "review_feedback_delay_ms")]
    review_feedback_delay: Duration,
    leaderboard_size: usize,
    personal_best_count: usize,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "session_ttl_secs")]
    session_ttl: Duration,
}

impl Default for RawGameConfig {
    fn default() -> Self {
        let tuning = GameTuning::default();
        Self {
            round_size: tuning.round_size,
            initial_duration_secs: tuning.schedule.initial_secs,
            minimum_duration_secs: tuning.schedule.minimum_secs,
            duration_step_secs: tuning.schedule.step_secs,
            fast_threshold_secs: tuning.fast_threshold_secs,
            review_feedback_delay: DEFAULT_REVIEW_FEEDBACK_DELAY,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            personal_best_count: DEFAULT_PERSONAL_BEST_COUNT,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single bank entry.
struct RawCollocation {
    verb: String,
    phrase: String,
    #[serde(default)]
    hint: Option<String>,
    #[serde(default)]
    definition: Option<String>,
    #[serde(default)]
    example: Option<String>,
    #[serde(default)]
    translation: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let game = value.game;
        let tuning = GameTuning {
            round_size: game.round_size,
            schedule: ClockSchedule {
                initial_secs: game.initial_duration_secs,
                minimum_secs: game.minimum_duration_secs,
                step_secs: game.duration_step_secs,
            },
            fast_threshold_secs: game.fast_threshold_secs,
        };

        let tuning = if tuning_is_consistent(&tuning) {
            tuning
        } else {
            warn!(?tuning, "inconsistent game tuning; using defaults");
            GameTuning::default()
        };

        let collocations = match value.collocations.map(sanitize_collocations) {
            Some(entries) if !entries.is_empty() => entries,
            Some(_) => {
                warn!("configured collocation bank is empty; using built-in bank");
                default_collocations()
            }
            None => default_collocations(),
        };

        Self {
            tuning,
            review_feedback_delay: game.review_feedback_delay,
            leaderboard_size: ranking_size(
                "leaderboard_size",
                game.leaderboard_size,
                DEFAULT_LEADERBOARD_SIZE,
            ),
            personal_best_count: ranking_size(
                "personal_best_count",
                game.personal_best_count,
                DEFAULT_PERSONAL_BEST_COUNT,
            ),
            session_ttl: game.session_ttl,
            collocations,
        }
    }
}

fn tuning_is_consistent(tuning: &GameTuning) -> bool {
    tuning.round_size > 0
        && tuning.schedule.minimum_secs > 0
        && tuning.schedule.initial_secs >= tuning.schedule.minimum_secs
}

fn ranking_size(key: &str, value: usize, default: usize) -> usize {
    if (1..=MAX_RANKING_SIZE).contains(&value) {
        value
    } else {
        warn!(key, value, default, "ranking size out of range; using default");
        default
    }
}

/// Trim entries and drop the ones without a verb or a phrase.
fn sanitize_collocations(raw: Vec<RawCollocation>) -> Vec<Collocation> {
    raw.into_iter()
        .filter_map(|entry| {
            let verb = entry.verb.trim();
            let phrase = entry.phrase.trim();
            if verb.is_empty() || phrase.is_empty() {
                warn!(verb = %entry.verb, phrase = %entry.phrase, "dropping blank collocation");
                return None;
            }
            Some(Collocation {
                correct_verb: verb.to_string(),
                phrase: phrase.to_string(),
                hint: non_blank(entry.hint),
                definition: non_blank(entry.definition),
                example: non_blank(entry.example),
                translation: non_blank(entry.translation),
            })
        })
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn entry(
    verb: &str,
    phrase: &str,
    hint: &str,
    definition: &str,
    example: &str,
    translation: &str,
) -> Collocation {
    Collocation {
        correct_verb: verb.to_string(),
        phrase: phrase.to_string(),
        hint: Some(hint.to_string()),
        definition: Some(definition.to_string()),
        example: Some(example.to_string()),
        translation: Some(translation.to_string()),
    }
}

/// Built-in bank of common English verb collocations shipped with the binary.
fn default_collocations() -> Vec<Collocation> {
    vec![
        entry(
            "make",
            "a decision",
            "choose",
            "to choose something after thinking about it",
            "We need to make a decision by Friday.",
            "tomar una decisión",
        ),
        entry(
            "make",
            "a mistake",
            "get it wrong",
            "to do something incorrectly",
            "Everyone makes a mistake now and then.",
            "cometer un error",
        ),
        entry(
            "make",
            "progress",
            "move forward",
            "to improve or get closer to a goal",
            "She is making good progress with her English.",
            "progresar",
        ),
        entry(
            "make",
            "an effort",
            "try hard",
            "to try to do something",
            "He made an effort to arrive on time.",
            "hacer un esfuerzo",
        ),
        entry(
            "take",
            "a break",
            "rest",
            "to stop working for a short time",
            "Let's take a break and get some coffee.",
            "tomar un descanso",
        ),
        entry(
            "take",
            "a photo",
            "camera",
            "to record an image with a camera",
            "Can you take a photo of us?",
            "sacar una foto",
        ),
        entry(
            "take",
            "a seat",
            "sit down",
            "to sit down",
            "Please take a seat, the doctor will see you soon.",
            "tomar asiento",
        ),
        entry(
            "take",
            "responsibility",
            "accept blame",
            "to accept that something is your duty or fault",
            "The manager took responsibility for the delay.",
            "asumir la responsabilidad",
        ),
        entry(
            "do",
            "homework",
            "school tasks",
            "to complete work set for after class",
            "I do my homework right after dinner.",
            "hacer los deberes",
        ),
        entry(
            "do",
            "the dishes",
            "kitchen chore",
            "to wash plates and cutlery after a meal",
            "It's your turn to do the dishes.",
            "lavar los platos",
        ),
        entry(
            "do",
            "business",
            "trade",
            "to buy and sell goods or services",
            "They have done business together for years.",
            "hacer negocios",
        ),
        entry(
            "do",
            "someone a favour",
            "help out",
            "to help someone",
            "Could you do me a favour and close the window?",
            "hacerle un favor a alguien",
        ),
        entry(
            "have",
            "a good time",
            "enjoy",
            "to enjoy yourself",
            "We had a good time at the party.",
            "pasarlo bien",
        ),
        entry(
            "have",
            "breakfast",
            "morning meal",
            "to eat the first meal of the day",
            "I usually have breakfast at seven.",
            "desayunar",
        ),
        entry(
            "have",
            "a look",
            "glance",
            "to look at something briefly",
            "Have a look at this report when you can.",
            "echar un vistazo",
        ),
        entry(
            "catch",
            "a cold",
            "get ill",
            "to become ill with a cold",
            "Wear a coat or you'll catch a cold.",
            "resfriarse",
        ),
        entry(
            "catch",
            "a bus",
            "public transport",
            "to get on a bus in time",
            "I have to catch the bus at eight.",
            "tomar el autobús",
        ),
        entry(
            "pay",
            "attention",
            "focus",
            "to watch or listen carefully",
            "Please pay attention to the instructions.",
            "prestar atención",
        ),
        entry(
            "pay",
            "a visit",
            "go and see",
            "to go and see a person or place",
            "We paid a visit to our grandparents.",
            "hacer una visita",
        ),
        entry(
            "keep",
            "a secret",
            "don't tell",
            "to not tell anyone something private",
            "Can you keep a secret?",
            "guardar un secreto",
        ),
        entry(
            "keep",
            "in touch",
            "stay in contact",
            "to continue to communicate with someone",
            "Let's keep in touch after the course.",
            "mantenerse en contacto",
        ),
        entry(
            "break",
            "a promise",
            "let down",
            "to not do what you said you would do",
            "He never breaks a promise.",
            "romper una promesa",
        ),
        entry(
            "break",
            "the ice",
            "start talking",
            "to make people feel relaxed at first meeting",
            "A joke helped to break the ice.",
            "romper el hielo",
        ),
        entry(
            "save",
            "time",
            "be quicker",
            "to reduce the time needed to do something",
            "Taking the train will save time.",
            "ahorrar tiempo",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::content::ContentBank;

    fn parse(json: &str) -> AppConfig {
        serde_json::from_str::<RawConfig>(json).unwrap().into()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse("{}");

        assert_eq!(config.tuning, GameTuning::default());
        assert_eq!(config.review_feedback_delay, Duration::from_millis(1_500));
        assert_eq!(config.leaderboard_size, 10);
        assert_eq!(config.personal_best_count, 5);
        assert_eq!(config.session_ttl, Duration::from_secs(1_800));
        assert_eq!(config.collocations, default_collocations());
    }

    #[test]
    fn game_section_overrides_tuning() {
        let config = parse(
            r#"{"game": {"round_size": 3, "initial_duration_secs": 20, "minimum_duration_secs": 4,
                "duration_step_secs": 2, "fast_threshold_secs": 3, "review_feedback_delay_ms": 0,
                "leaderboard_size": 25, "session_ttl_secs": 120}}"#,
        );

        assert_eq!(config.tuning.round_size, 3);
        assert_eq!(config.tuning.schedule.initial_secs, 20);
        assert_eq!(config.tuning.schedule.minimum_secs, 4);
        assert_eq!(config.tuning.schedule.step_secs, 2);
        assert_eq!(config.tuning.fast_threshold_secs, 3);
        assert!(config.review_feedback_delay.is_zero());
        assert_eq!(config.leaderboard_size, 25);
        assert_eq!(config.session_ttl, Duration::from_secs(120));
    }

    #[test]
    fn inconsistent_tuning_falls_back_to_defaults() {
        for game in [
            r#"{"round_size": 0}"#,
            r#"{"minimum_duration_secs": 0}"#,
            r#"{"initial_duration_secs": 3, "minimum_duration_secs": 5}"#,
        ] {
            let config = parse(&format!(r#"{{"game": {game}}}"#));
            assert_eq!(config.tuning, GameTuning::default(), "{game}");
        }
    }

    #[test]
    fn out_of_range_ranking_sizes_fall_back() {
        let config = parse(r#"{"game": {"leaderboard_size": 0, "personal_best_count": 500}}"#);

        assert_eq!(config.leaderboard_size, 10);
        assert_eq!(config.personal_best_count, 5);
    }

    #[test]
    fn blank_collocations_are_dropped() {
        let config = parse(
            r#"{"collocations": [
                {"verb": " make ", "phrase": "a plan ", "hint": "  "},
                {"verb": "", "phrase": "a break"},
                {"verb": "take", "phrase": "   "}
            ]}"#,
        );

        assert_eq!(config.collocations, vec![Collocation::new("make", "a plan")]);
    }

    #[test]
    fn fully_blank_bank_uses_built_in_entries() {
        let config = parse(r#"{"collocations": [{"verb": " ", "phrase": "x"}]}"#);

        assert_eq!(config.collocations, default_collocations());
    }

    #[test]
    fn built_in_bank_fills_a_default_round() {
        let bank = ContentBank::new(default_collocations());

        assert!(bank.unique_phrases() >= GameTuning::default().round_size);
        assert!(bank.verbs().len() >= 5);
        assert!(
            bank.entries()
                .iter()
                .all(|entry| entry.definition.is_some() && entry.translation.is_some())
        );
    }
}
