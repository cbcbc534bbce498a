//! Prompt templates for the LLM-backed endpoints and the canned answers used
//! when the model does not return the expected shape.

use serde_json::{json, Value};

use crate::models::{
    AdVariation, CampaignDraft, CampaignGenerationRequest, PlatformSuggestion, ProductBrief,
    UntappedInterest, WebsiteAnalysisResponse,
};
use crate::services::gemini::GenerationSettings;

const PRODUCT_PREVIEW_COUNT: usize = 5;
const PRODUCT_DESCRIPTION_PREVIEW: usize = 100;

pub fn campaign_settings() -> GenerationSettings {
    GenerationSettings::new(0.8, 2500)
}

pub fn website_analysis_settings() -> GenerationSettings {
    GenerationSettings::new(0.7, 1500)
}

pub fn platform_suggestions_settings() -> GenerationSettings {
    GenerationSettings::new(0.6, 1200)
}

pub fn campaign_prompt(request: &CampaignGenerationRequest) -> String {
    let product = &request.product;
    format!(
        r#"
Generate a comprehensive advertising campaign for this product:

Product Details:
- Name: {name}
- Description: {description}
- Price: ${price} {currency}
- Category: {category}

Campaign Parameters:
- Platform: {platform}
- Budget: ${budget}/day
- Language: {language}
- Goal: {goal}

Generate a JSON response with:
{{
    "primary_copy": {{
        "headline": "compelling headline",
        "description": "engaging description",
        "cta": "call to action"
    }},
    "variations": [
        {{
            "headline": "variation headline",
            "description": "variation description",
            "cta": "variation cta"
        }}
    ],
    "creative_instructions": "detailed creative guidance",
    "untapped_interests": [
        {{
            "interest": "specific interest name",
            "success_score": 85,
            "competition": "low|medium|high",
            "reasoning": "why this interest has potential"
        }}
    ],
    "targeting_suggestions": {{
        "demographics": {{}},
        "behaviors": [],
        "lookalike_audiences": []
    }}
}}

Requirements:
- Create 3 ad variations total (1 primary + 2 variations)
- Generate at least 10 untapped interests with success scores 0-100
- Focus on interests with low-medium competition
- Provide detailed reasoning for each interest
- Make copy compelling and platform-appropriate
"#,
        name = product.name.as_deref().unwrap_or("Unknown Product"),
        description = product.description.as_deref().unwrap_or("No description"),
        price = product.price.unwrap_or(0.0),
        currency = product.currency.as_deref().unwrap_or("USD"),
        category = product.category.as_deref().unwrap_or("General"),
        platform = request.platform,
        budget = request.budget,
        language = request.language,
        goal = request.goal,
    )
}

/// Draft returned when the model's answer has no `primary_copy`.
pub fn fallback_campaign_draft(product: &ProductBrief) -> CampaignDraft {
    CampaignDraft {
        primary_copy: AdVariation {
            headline: format!(
                "Discover {}",
                product.name.as_deref().unwrap_or("Amazing Products")
            ),
            description: format!(
                "Premium quality {} at unbeatable prices",
                product.category.as_deref().unwrap_or("products")
            ),
            cta: "Shop Now".to_string(),
        },
        variations: vec![AdVariation {
            headline: format!(
                "Transform Your Life with {}",
                product.name.as_deref().unwrap_or("Our Products")
            ),
            description: "Experience the difference quality makes".to_string(),
            cta: "Learn More".to_string(),
        }],
        creative_instructions: "Use high-quality product images with lifestyle context".to_string(),
        untapped_interests: vec![UntappedInterest {
            interest: "quality conscious consumers".to_string(),
            success_score: 80,
            competition: "medium".to_string(),
            reasoning: "Growing segment focused on product quality over price".to_string(),
        }],
        targeting_suggestions: json!({"demographics": {"age_range": "25-54"}}),
        name: None,
        platform: None,
        goal: None,
        budget: None,
    }
}

pub fn website_analysis_prompt(site_data: &Value) -> String {
    let site_meta = &site_data["site_meta"];
    let products = site_data["products"].as_array().map(Vec::as_slice).unwrap_or(&[]);

    let product_lines: Vec<String> = products
        .iter()
        .take(PRODUCT_PREVIEW_COUNT)
        .map(|p| {
            let description: String = p["description"]
                .as_str()
                .unwrap_or("No description")
                .chars()
                .take(PRODUCT_DESCRIPTION_PREVIEW)
                .collect();
            format!("- {}: {}...", p["name"].as_str().unwrap_or("Unknown"), description)
        })
        .collect();

    format!(
        r#"
Analyze this e-commerce website and provide insights:

Website: {title}
Description: {description}

Products ({count} total):
{products}

Please provide a JSON response with:
{{
    "strengths": ["strength1", "strength2", ...],
    "weaknesses": ["weakness1", "weakness2", ...],
    "improvement_suggestions": ["suggestion1", "suggestion2", ...],
    "product_positioning": "detailed positioning analysis"
}}
"#,
        title = site_meta["title"].as_str().unwrap_or("Unknown"),
        description = site_meta["description"].as_str().unwrap_or("No description"),
        count = products.len(),
        products = product_lines.join("\n"),
    )
}

pub fn fallback_website_analysis() -> WebsiteAnalysisResponse {
    WebsiteAnalysisResponse {
        strengths: vec![
            "Professional website design".to_string(),
            "Clear product catalog".to_string(),
        ],
        weaknesses: vec![
            "Limited analysis available".to_string(),
            "API integration needed".to_string(),
        ],
        improvement_suggestions: vec![
            "Add customer reviews".to_string(),
            "Improve SEO optimization".to_string(),
        ],
        product_positioning: "Products appear to target quality-conscious consumers".to_string(),
    }
}

pub fn platform_suggestions_prompt(product_type: Option<&str>) -> String {
    let product_type = product_type
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("general e-commerce products");

    format!(
        r#"
Analyze the best advertising platforms for this product type: {product_type}

Consider factors like:
- Target audience demographics
- Platform reach and engagement
- Cost effectiveness
- Ad format suitability
- Competition levels

Provide a JSON response with platform suggestions:
{{
    "suggestions": [
        {{
            "platform": "Meta",
            "score": 85,
            "rationale": "Excellent targeting options and visual ad formats",
            "estimated_reach": 2500000,
            "cost_effectiveness": "high"
        }},
        ...
    ]
}}

Include platforms: Meta, Google, TikTok, LinkedIn, X (Twitter)
Score each platform 0-100 based on suitability.
"#
    )
}

pub fn fallback_platform_suggestions() -> Vec<PlatformSuggestion> {
    vec![
        PlatformSuggestion {
            platform: "Meta".to_string(),
            score: 90.0,
            rationale: "Excellent visual ad formats and precise targeting".to_string(),
            estimated_reach: 2_500_000,
            cost_effectiveness: "high".to_string(),
        },
        PlatformSuggestion {
            platform: "Google".to_string(),
            score: 85.0,
            rationale: "High-intent search traffic and shopping ads".to_string(),
            estimated_reach: 1_800_000,
            cost_effectiveness: "high".to_string(),
        },
        PlatformSuggestion {
            platform: "TikTok".to_string(),
            score: 75.0,
            rationale: "Great for reaching younger demographics".to_string(),
            estimated_reach: 1_200_000,
            cost_effectiveness: "medium".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdPlatform, CampaignGoal};

    #[test]
    fn test_campaign_prompt_includes_product_and_parameters() {
        let request = CampaignGenerationRequest {
            product: ProductBrief {
                name: Some("Trail Runner 2".to_string()),
                description: Some("Lightweight running shoe".to_string()),
                price: Some(129.5),
                currency: Some("EUR".to_string()),
                category: None,
            },
            platform: AdPlatform::Meta,
            budget: 40.0,
            language: "de".to_string(),
            goal: CampaignGoal::Conversions,
        };

        let prompt = campaign_prompt(&request);

        assert!(prompt.contains("- Name: Trail Runner 2"));
        assert!(prompt.contains("- Price: $129.5 EUR"));
        assert!(prompt.contains("- Category: General"));
        assert!(prompt.contains("- Platform: meta"));
        assert!(prompt.contains("- Budget: $40/day"));
        assert!(prompt.contains("- Language: de"));
        assert!(prompt.contains("- Goal: conversions"));
        assert!(prompt.contains("at least 10 untapped interests"));
    }

    #[test]
    fn test_website_analysis_prompt_previews_first_five_products() {
        let products: Vec<Value> = (0..7)
            .map(|i| json!({"name": format!("Item {}", i), "description": "d".repeat(300)}))
            .collect();
        let site_data = json!({
            "site_meta": {"title": "Acme Outfitters"},
            "products": products,
        });

        let prompt = website_analysis_prompt(&site_data);

        assert!(prompt.contains("Website: Acme Outfitters"));
        assert!(prompt.contains("Description: No description"));
        assert!(prompt.contains("Products (7 total):"));
        assert!(prompt.contains("- Item 4: "));
        assert!(!prompt.contains("- Item 5: "));
        assert!(prompt.contains(&format!("{}...", "d".repeat(100))));
        assert!(!prompt.contains(&"d".repeat(101)));
    }

    #[test]
    fn test_platform_prompt_defaults_product_type() {
        assert!(platform_suggestions_prompt(None).contains("general e-commerce products"));
        assert!(platform_suggestions_prompt(Some("  ")).contains("general e-commerce products"));
        assert!(platform_suggestions_prompt(Some("yoga mats")).contains("product type: yoga mats"));
    }

    #[test]
    fn test_fallback_draft_uses_product_name() {
        let draft = fallback_campaign_draft(&ProductBrief {
            name: Some("Desk Lamp".to_string()),
            ..ProductBrief::default()
        });

        assert_eq!(draft.primary_copy.headline, "Discover Desk Lamp");
        assert_eq!(draft.primary_copy.description, "Premium quality products at unbeatable prices");
        assert_eq!(draft.variations.len(), 1);
        assert_eq!(draft.untapped_interests[0].success_score, 80);
    }
}
