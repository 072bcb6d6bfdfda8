//! crates/design_studio_core/src/prompts.rs
//!
//! Natural-language templates sent to the content generator.

use crate::domain::{DesignAttributes, Stage};

const DEFAULT_STYLE_NOTE: &str = "Clean and natural style";

/// Renders the selected insights as a bullet list under `heading`.
/// Returns an empty string when no insights are selected.
pub fn insights_block(heading: &str, insights: &[String]) -> String {
    if insights.is_empty() {
        return String::new();
    }
    let bullets: Vec<String> = insights.iter().map(|i| format!("- {}", i)).collect();
    format!("\n{}\n{}", heading, bullets.join("\n"))
}

fn insights_heading(stage: Stage) -> &'static str {
    match stage {
        Stage::ImagePrompt => "Include these key trend insights:",
        Stage::LookAndFeel => "Incorporate these insights:",
        Stage::Marketing => "Leverage these insights in the marketing:",
        Stage::Packaging => "Consider these insights for packaging design:",
        Stage::ManufacturingCost => "Incorporate these insights into cost considerations:",
        Stage::CustomerCost => "Consider these insights for customer pricing:",
        Stage::Formulation => "Address these insights in the formulation details:",
        Stage::Visuals => "Draw inspiration from these insights for the design visuals:",
    }
}

/// Builds the prompt for one pipeline stage from the design attributes.
pub fn stage_prompt(stage: Stage, attrs: &DesignAttributes) -> String {
    let insights = insights_block(insights_heading(stage), &attrs.selected_insights);
    let DesignAttributes {
        design_name: name,
        demographic,
        length,
        color,
        braid_type,
        style_note,
        ..
    } = attrs;

    match stage {
        Stage::ImagePrompt => {
            let notes = if style_note.trim().is_empty() {
                DEFAULT_STYLE_NOTE
            } else {
                style_note.as_str()
            };
            format!(
                "Create a detailed image generation prompt for a braid style that is:\n\
                 - Design Name: {name}\n\
                 - Target Demographic: {demographic}\n\
                 - Length: {length}\n\
                 - Color: {color}\n\
                 - Braid Type: {braid_type}\n\
                 - Style Notes: {notes}\n\
                 {insights}\n\
                 Focus on visual details, less than 100 words for a stable diffusion image generator."
            )
        }
        Stage::LookAndFeel => format!(
            "Describe the overall look and feel for braid style {name} with these characteristics: \n\
             Demographic: {demographic}, Length: {length}, Color: {color}, Braid Type: {braid_type}, Custom Style: {style_note}.\n\
             {insights}\n\
             Focus on aspects that describe the overall aesthetic of the design."
        ),
        Stage::Marketing => format!(
            "Marketing plan for braid style {name}, demographic {demographic}, with the following attributes: \
             Length {length}, Color {color}, Braid Type: {braid_type}, Custom Style: {style_note}.\n\
             {insights}\n\
             Include target channels, key messages, and promotional ideas."
        ),
        Stage::Packaging => format!(
            "Packaging plan for braid style {name}, demographic {demographic}, characterized by \
             Length: {length}, Color: {color}, Braid Type: {braid_type}, Custom Style: {style_note}.\n\
             {insights}\n\
             Include packaging materials, design elements, and sustainability considerations."
        ),
        Stage::ManufacturingCost => format!(
            "Manufacturing costs for braid style {name}: Demographic: {demographic}, Length: {length}, \
             Color: {color}, Braid Type: {braid_type}, Custom Style: {style_note}.\n\
             {insights}\n\
             Detail materials, labor, and overhead costs."
        ),
        Stage::CustomerCost => format!(
            "Customer costs for braid style {name}: Demographic: {demographic}, Length: {length}, \
             Color: {color}, Braid Type: {braid_type}, Custom Style: {style_note}.\n\
             {insights}\n\
             Detail product price, installation fees, maintenance costs."
        ),
        Stage::Formulation => format!(
            "Outline the formulation details for braid style: {name}. Take into account: \
             Demographic: {demographic}, Length: {length}, Color: {color}, Braid Type: {braid_type}, \
             Custom Style: {style_note}.\n\
             {insights}"
        ),
        Stage::Visuals => format!(
            "Outline the visual inspiration for the design: {name} by taking into account: \
             Demographic: {demographic}, Length: {length}, Color: {color}, Braid Type: {braid_type}, \
             Custom Style: {style_note}.\n\
             {insights}"
        ),
    }
}

/// Builds the prompt for a short analytics remark shown next to a chart or table.
pub fn trend_insight(context: &str, dataset_summary: &str) -> String {
    format!(
        "Provide a short, data-driven insight based on Google Trends data.\n\n\
         Context: {context}\n\
         Dataset Summary: {dataset_summary}\n\n\
         Keep it concise (a few sentences and under 200 words) and insightful."
    )
}
