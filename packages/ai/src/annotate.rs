//! Advisory generation for severe hotspots.
//!
//! For every hotspot whose count exceeds the severe threshold, a prompt is
//! built from its time mode, weather mode, and severity distribution, and
//! the provider's answer is stored in [`HotspotSummary::advisory`]. A
//! failure for one location is logged and leaves that advisory empty; it
//! never fails the batch.

use accident_map_hotspot_models::{Histogram, HotspotSummary};
use accident_map_retry::{RetryPolicy, retry};
use futures::StreamExt as _;
use tokio::time::Instant;

use crate::providers::LlmProvider;

/// Default minimum count a hotspot must strictly exceed to be annotated.
pub const DEFAULT_SEVERE_THRESHOLD: u64 = 90;

/// Default language for generated advisories.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Settings for [`annotate_hotspots`].
#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    /// Only hotspots with a count strictly above this are annotated.
    pub severe_threshold: u64,
    /// Language the advisory should be written in.
    pub language: String,
    /// Maximum provider calls in flight. `1` annotates strictly in order.
    pub concurrency: usize,
    /// Retry policy for rate-limited calls.
    pub retry: RetryPolicy,
    /// Locations not finished by this instant are left unannotated.
    pub deadline: Option<Instant>,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            severe_threshold: DEFAULT_SEVERE_THRESHOLD,
            language: DEFAULT_LANGUAGE.to_string(),
            concurrency: 1,
            retry: RetryPolicy::default(),
            deadline: None,
        }
    }
}

/// Outcome counts for one annotation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationReport {
    /// Hotspots above the severe threshold.
    pub eligible: usize,
    /// Hotspots that received an advisory.
    pub annotated: usize,
    /// Hotspots whose provider call failed.
    pub failed: usize,
    /// Hotspots not attempted because the deadline had passed.
    pub skipped: usize,
}

enum Outcome {
    Annotated(String),
    Failed,
    Skipped,
}

/// Renders a severity histogram as `"3 minor, 1 fatal"`, in histogram
/// order.
#[must_use]
pub fn severity_phrase(severities: &Histogram) -> String {
    severities
        .iter()
        .map(|(severity, count)| format!("{count} {severity}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the advisory prompt for one hotspot.
#[must_use]
pub fn build_prompt(hotspot: &HotspotSummary, language: &str) -> String {
    format!(
        "Given this info, give me 1 piece of advice in {language} on how to prevent \
         an accident given the cause of the accidents, in under 10 words: \
         Car accidents happened at {time} when the weather was {weather} and the \
         accidents that occurred were {severities}",
        time = hotspot.time,
        weather = hotspot.weather,
        severities = severity_phrase(&hotspot.severities),
    )
}

/// Attaches advisories to the severe hotspots in `hotspots`.
///
/// Hotspots keep their positions; only `advisory` is written. Up to
/// `options.concurrency` provider calls run at once.
pub async fn annotate_hotspots(
    provider: &dyn LlmProvider,
    hotspots: &mut [HotspotSummary],
    options: &AnnotateOptions,
) -> AnnotationReport {
    let eligible: Vec<(usize, String)> = hotspots
        .iter()
        .enumerate()
        .filter(|(_, hotspot)| hotspot.count > options.severe_threshold)
        .map(|(index, hotspot)| (index, build_prompt(hotspot, &options.language)))
        .collect();

    let mut report = AnnotationReport {
        eligible: eligible.len(),
        ..AnnotationReport::default()
    };

    if eligible.is_empty() {
        return report;
    }

    log::info!(
        "Requesting {} advisories from {} (concurrency {})",
        eligible.len(),
        provider.model(),
        options.concurrency.max(1)
    );

    let outcomes: Vec<(usize, Outcome)> = futures::stream::iter(eligible)
        .map(move |(index, prompt)| async move {
            (index, annotate_one(provider, &prompt, options).await)
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    for (index, outcome) in outcomes {
        let hotspot = &mut hotspots[index];
        match outcome {
            Outcome::Annotated(advisory) => {
                hotspot.advisory = Some(advisory);
                report.annotated += 1;
            }
            Outcome::Failed => report.failed += 1,
            Outcome::Skipped => {
                log::warn!(
                    "Deadline passed, skipping advisory for {}",
                    hotspot.location()
                );
                report.skipped += 1;
            }
        }
    }

    log::info!(
        "Advisories: {} annotated, {} failed, {} skipped of {} eligible",
        report.annotated,
        report.failed,
        report.skipped,
        report.eligible
    );

    report
}

async fn annotate_one(
    provider: &dyn LlmProvider,
    prompt: &str,
    options: &AnnotateOptions,
) -> Outcome {
    if let Some(deadline) = options.deadline
        && Instant::now() >= deadline
    {
        return Outcome::Skipped;
    }

    let call = retry(&options.retry, "advisory", options.deadline, || {
        provider.complete(prompt)
    });

    let result = match options.deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("Advisory request cut off by deadline");
                return Outcome::Failed;
            }
        },
        None => call.await,
    };

    match result {
        Ok(text) => {
            let advisory = text.trim();
            if advisory.is_empty() {
                log::warn!("Provider returned an empty advisory");
                Outcome::Failed
            } else {
                Outcome::Annotated(advisory.to_string())
            }
        }
        Err(e) => {
            log::warn!("Advisory request failed: {e}");
            Outcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::AiError;

    type Script = Box<dyn Fn(&str, u32) -> Result<String, AiError> + Send + Sync>;

    /// Answers from a script given the prompt and the 1-based call number.
    struct ScriptedProvider {
        calls: AtomicU32,
        prompts: Mutex<Vec<String>>,
        script: Script,
    }

    impl ScriptedProvider {
        fn new(
            script: impl Fn(&str, u32) -> Result<String, AiError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                calls: AtomicU32::new(0),
                prompts: Mutex::new(Vec::new()),
                script: Box::new(script),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(&self, prompt: &str) -> Result<String, AiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.prompts.lock().unwrap().push(prompt.to_string());
            (self.script)(prompt, n)
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn rate_limited() -> AiError {
        AiError::RateLimited {
            message: "429".to_string(),
        }
    }

    fn hotspot(count: u64, time: &str) -> HotspotSummary {
        HotspotSummary {
            latitude: 45.5,
            longitude: -73.5,
            count,
            severities: [("minor", count - 1), ("fatal", 1)].into_iter().collect(),
            weather: "clear".to_string(),
            time: time.to_string(),
            advisory: None,
        }
    }

    fn fast_options() -> AnnotateOptions {
        AnnotateOptions {
            retry: RetryPolicy::new(3, Duration::from_millis(1), 2),
            ..AnnotateOptions::default()
        }
    }

    #[test]
    fn severity_phrase_follows_histogram_order() {
        let severities: Histogram = [("minor", 3), ("fatal", 1)].into_iter().collect();
        assert_eq!(severity_phrase(&severities), "3 minor, 1 fatal");
    }

    #[test]
    fn prompt_mentions_every_factor() {
        let prompt = build_prompt(&hotspot(4, "16:59:00"), "French");
        assert!(prompt.contains("in French"));
        assert!(prompt.contains("at 16:59:00"));
        assert!(prompt.contains("weather was clear"));
        assert!(prompt.contains("3 minor, 1 fatal"));
        assert!(prompt.contains("under 10 words"));
    }

    #[tokio::test]
    async fn severe_threshold_is_strict() {
        let provider =
            ScriptedProvider::new(|_, _| Ok(" Slow down near intersections. ".to_string()));
        let mut hotspots = vec![hotspot(91, "17"), hotspot(90, "08")];

        let report = annotate_hotspots(&provider, &mut hotspots, &fast_options()).await;

        assert_eq!(hotspots[0].advisory.as_deref(), Some("Slow down near intersections."));
        assert_eq!(hotspots[1].advisory, None);
        assert_eq!(provider.calls(), 1);
        assert_eq!(
            report,
            AnnotationReport {
                eligible: 1,
                annotated: 1,
                failed: 0,
                skipped: 0
            }
        );
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_the_others() {
        let provider = ScriptedProvider::new(|prompt, _| {
            if prompt.contains("at 17 ") {
                Err(AiError::Provider {
                    message: "bad request".to_string(),
                })
            } else {
                Ok("Watch for cyclists.".to_string())
            }
        });
        let mut hotspots = vec![hotspot(120, "08"), hotspot(110, "17"), hotspot(100, "22")];

        let report = annotate_hotspots(&provider, &mut hotspots, &fast_options()).await;

        assert!(hotspots[0].advisory.is_some());
        assert!(hotspots[1].advisory.is_none());
        assert!(hotspots[2].advisory.is_some());
        assert_eq!(provider.calls(), 3);
        assert_eq!(report.annotated, 2);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn rate_limits_are_retried() {
        let provider = ScriptedProvider::new(|_, n| {
            if n < 3 {
                Err(rate_limited())
            } else {
                Ok("Reduce speed in snow.".to_string())
            }
        });
        let mut hotspots = vec![hotspot(95, "08")];

        let report = annotate_hotspots(&provider, &mut hotspots, &fast_options()).await;

        assert_eq!(provider.calls(), 3);
        assert_eq!(report.annotated, 1);
        assert_eq!(hotspots[0].advisory.as_deref(), Some("Reduce speed in snow."));
    }

    #[tokio::test]
    async fn exhausted_retries_leave_advisory_empty() {
        let provider = ScriptedProvider::new(|_, _| Err(rate_limited()));
        let mut hotspots = vec![hotspot(95, "08")];

        let report = annotate_hotspots(&provider, &mut hotspots, &fast_options()).await;

        assert_eq!(provider.calls(), 3);
        assert_eq!(report.failed, 1);
        assert!(hotspots[0].advisory.is_none());
    }

    #[tokio::test]
    async fn passed_deadline_skips_remaining_locations() {
        let provider = ScriptedProvider::new(|_, _| Ok("unused".to_string()));
        let mut hotspots = vec![hotspot(95, "08"), hotspot(93, "09")];
        let options = AnnotateOptions {
            deadline: Some(Instant::now()),
            ..fast_options()
        };

        let report = annotate_hotspots(&provider, &mut hotspots, &options).await;

        assert_eq!(provider.calls(), 0);
        assert_eq!(report.skipped, 2);
        assert!(hotspots.iter().all(|h| h.advisory.is_none()));
    }

    #[tokio::test]
    async fn concurrent_annotation_keeps_positions() {
        let provider = ScriptedProvider::new(|prompt, _| {
            let time = prompt
                .split("happened at ")
                .nth(1)
                .and_then(|rest| rest.split(' ').next())
                .unwrap_or_default();
            Ok(format!("tip for {time}"))
        });
        let mut hotspots = vec![
            hotspot(150, "08"),
            hotspot(140, "09"),
            hotspot(50, "10"),
            hotspot(130, "11"),
        ];
        let options = AnnotateOptions {
            concurrency: 3,
            ..fast_options()
        };

        let report = annotate_hotspots(&provider, &mut hotspots, &options).await;

        assert_eq!(report.annotated, 3);
        assert_eq!(hotspots[0].advisory.as_deref(), Some("tip for 08"));
        assert_eq!(hotspots[1].advisory.as_deref(), Some("tip for 09"));
        assert_eq!(hotspots[2].advisory, None);
        assert_eq!(hotspots[3].advisory.as_deref(), Some("tip for 11"));
        assert_eq!(provider.prompts.lock().unwrap().len(), 3);
    }
}
