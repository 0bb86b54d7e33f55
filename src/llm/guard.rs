use crate::config::prompt::PromptConfig;
use log::debug;

/// Swaps provider refusals that drift away from the firm's topics for a canned
/// on-topic redirect. Best effort: it only looks at phrases, not meaning.
#[derive(Debug, Clone)]
pub struct TopicGuard {
    refusal_indicators: Vec<String>,
    domain_terms: Vec<String>,
    redirect: String,
}

impl TopicGuard {
    pub fn new(refusal_indicators: Vec<String>, domain_terms: Vec<String>, redirect: String) -> Self {
        let domain_terms = domain_terms.into_iter().map(|t| t.to_lowercase()).collect();
        Self { refusal_indicators, domain_terms, redirect }
    }

    pub fn from_config(config: &PromptConfig) -> Self {
        Self::new(
            config.refusal_indicators.clone(),
            config.domain_terms.clone(),
            config.off_topic_redirect.clone(),
        )
    }

    pub fn is_off_topic_refusal(&self, text: &str) -> bool {
        let refuses = self.refusal_indicators.iter().any(|phrase| text.contains(phrase.as_str()));
        if !refuses {
            return false;
        }
        let lowered = text.to_lowercase();
        !self.domain_terms.iter().any(|term| lowered.contains(term.as_str()))
    }

    pub fn apply(&self, text: String) -> String {
        if self.is_off_topic_refusal(&text) {
            debug!("Replacing off-topic refusal: {}", text);
            self.redirect.clone()
        } else {
            text
        }
    }
}

impl Default for TopicGuard {
    fn default() -> Self {
        Self::from_config(&PromptConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::prompt::OFF_TOPIC_REDIRECT;

    #[test]
    fn bare_refusal_is_redirected() {
        let guard = TopicGuard::default();
        let out = guard.apply("I cannot provide information about that.".to_string());
        assert_eq!(out, OFF_TOPIC_REDIRECT);
    }

    #[test]
    fn refusal_mentioning_the_domain_is_kept() {
        let guard = TopicGuard::default();
        let text = "I cannot provide information about architecture fees.".to_string();
        assert_eq!(guard.apply(text.clone()), text);
    }

    #[test]
    fn allow_terms_ignore_case() {
        let guard = TopicGuard::default();
        assert!(!guard.is_off_topic_refusal("I'm not programmed to quote F9 prices."));
        assert!(!guard.is_off_topic_refusal("I cannot discuss RESIDENTIAL zoning law."));
    }

    #[test]
    fn plain_answers_pass_through() {
        let guard = TopicGuard::default();
        let text = "The weather is nice today.".to_string();
        assert_eq!(guard.apply(text.clone()), text);
    }

    #[test]
    fn refusal_phrases_match_case_sensitively() {
        let guard = TopicGuard::default();
        assert!(!guard.is_off_topic_refusal("i cannot discuss that"));
        assert!(guard.is_off_topic_refusal("Sorry, I cannot discuss that."));
    }

    #[test]
    fn custom_vocabulary() {
        let guard = TopicGuard::new(vec!["no comment".into()], vec!["Atrium".into()], "redirect".into());
        assert_eq!(guard.apply("no comment on taxes".into()), "redirect");
        assert_eq!(guard.apply("no comment on the atrium".into()), "no comment on the atrium");
    }
}
