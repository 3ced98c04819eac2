use crate::models::{Channel, Labels, Platform, Product};

/// Derive Channel, Platform and Product from a campaign identifier.
///
/// Matching is case-insensitive substring search and the first rule that
/// matches wins for each label. A missing identifier classifies as `Other`
/// across the board.
pub fn classify(campaign: Option<&str>) -> Labels {
    let Some(raw) = campaign else {
        return Labels {
            product: Product::Other,
            channel: Channel::Other,
            platform: Platform::Other,
        };
    };
    let lowered = raw.to_lowercase();

    Labels {
        product: detect_product(&lowered),
        channel: detect_channel(&lowered),
        platform: detect_platform(&lowered),
    }
}

fn detect_channel(id: &str) -> Channel {
    if id.contains("goo") {
        Channel::Google
    } else if id.contains("fb") {
        Channel::Facebook
    } else {
        Channel::Other
    }
}

fn detect_platform(id: &str) -> Platform {
    if id.contains("form") {
        Platform::LeadForm
    } else if id.contains("web") {
        Platform::LeadWeb
    } else {
        Platform::Other
    }
}

fn detect_product(id: &str) -> Product {
    if id.contains("sucfr") {
        Product::Sucrose
    } else if id.contains("life") {
        Product::Life
    } else if id.contains("dairy") {
        Product::Dairy
    } else {
        Product::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_identifier_is_other_everywhere() {
        let labels = classify(None);
        assert_eq!(labels.channel, Channel::Other);
        assert_eq!(labels.platform, Platform::Other);
        assert_eq!(labels.product, Product::Other);
    }

    #[test]
    fn matching_ignores_case() {
        let labels = classify(Some("ENS_GOOgle_WEB_Life"));
        assert_eq!(labels.channel, Channel::Google);
        assert_eq!(labels.platform, Platform::LeadWeb);
        assert_eq!(labels.product, Product::Life);
    }

    #[test]
    fn first_rule_wins_per_label() {
        let labels = classify(Some("goo_fb_form_web_sucfr_dairy"));
        assert_eq!(labels.channel, Channel::Google);
        assert_eq!(labels.platform, Platform::LeadForm);
        assert_eq!(labels.product, Product::Sucrose);

        let labels = classify(Some("fb_life_dairy"));
        assert_eq!(labels.channel, Channel::Facebook);
        assert_eq!(labels.platform, Platform::Other);
        assert_eq!(labels.product, Product::Life);
    }

    #[test]
    fn unmatched_identifier_is_other() {
        let labels = classify(Some("tiktok_video"));
        assert_eq!(labels.channel, Channel::Other);
        assert_eq!(labels.platform, Platform::Other);
        assert_eq!(labels.product, Product::Other);
    }

    #[test]
    fn classification_is_stable() {
        let ids = ["fb_form", "goo_web", "ENS-Dairy-FB", "", "random"];
        for id in ids {
            assert_eq!(classify(Some(id)), classify(Some(id)));
        }
    }
}
