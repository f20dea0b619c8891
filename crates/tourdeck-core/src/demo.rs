//! The welcome tour a fresh workspace starts with.

use crate::steps::{HighlightRect, StepCollection, StepPayload};

pub fn demo_payloads() -> Vec<StepPayload> {
    vec![
        StepPayload::new(
            "Welcome to Your Product",
            "Start your journey with our intuitive dashboard that helps you track everything in one place.",
        )
        .with_image("https://images.unsplash.com/photo-1551650975-87deedd944c3?w=600&h=300&fit=crop")
        .with_highlight(HighlightRect::new(50.0, 100.0, 200.0, 80.0)),
        StepPayload::new(
            "Explore Key Features",
            "Discover powerful analytics and insights that drive your business forward.",
        )
        .with_image("https://images.unsplash.com/photo-1460925895917-afdab827c52f?w=600&h=300&fit=crop")
        .with_highlight(HighlightRect::new(300.0, 150.0, 250.0, 100.0)),
        StepPayload::new(
            "Customize Your Experience",
            "Personalize your workspace to match your workflow and preferences.",
        )
        .with_image("https://images.unsplash.com/photo-1551288049-bebda4e38f71?w=600&h=300&fit=crop")
        .with_highlight(HighlightRect::new(100.0, 200.0, 300.0, 120.0)),
    ]
}

pub fn seed_collection() -> StepCollection {
    StepCollection::from_payloads(demo_payloads())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_tour_has_three_complete_steps() {
        let collection = seed_collection();
        assert_eq!(collection.len(), 3);
        assert!(collection.iter().all(|step| {
            !step.title.is_empty() && !step.description.is_empty() && step.image.is_some()
        }));
        assert_eq!(
            collection.step_at(1).map(|step| step.highlight),
            Some(HighlightRect::new(300.0, 150.0, 250.0, 100.0))
        );
    }
}
