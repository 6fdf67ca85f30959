// Template analysis adapter - deterministic offline suggestions per campaign

use crate::domain::errors::*;
use crate::domain::model::{CampaignGoal, TargetAudience};
use crate::ports::*;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

/// Template times are laid out against a clip of this length
const REFERENCE_DURATION: f64 = 30.0;

/// Analyzer that builds a suggestion from campaign templates instead of a model
#[derive(Debug, Clone, Default)]
pub struct CampaignTemplateAnalyzer {
    latency: Option<Duration>,
}

impl CampaignTemplateAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, to mimic a remote model
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn cut_reasons(goal: CampaignGoal) -> [&'static str; 2] {
        match goal {
            CampaignGoal::Sales => ["dynamic cut for sales", "focus on positive reactions"],
            CampaignGoal::Awareness => ["establish the brand early", "hold on the logo"],
            CampaignGoal::Engagement => ["fast hook for the feed", "keep the reaction shot"],
            CampaignGoal::Education => ["keep the explanation intact", "show the demonstration"],
            CampaignGoal::Recruitment => ["introduce the team", "keep the testimonial"],
        }
    }

    fn captions(goal: CampaignGoal) -> [&'static str; 3] {
        match goal {
            CampaignGoal::Sales => [
                "Hello! Welcome",
                "Today we present an amazing product",
                "that will change the way you work",
            ],
            CampaignGoal::Awareness => [
                "Meet the brand",
                "Built for people like you",
                "Remember the name",
            ],
            CampaignGoal::Engagement => [
                "Wait for it",
                "Did you see that?",
                "Tell us what you think",
            ],
            CampaignGoal::Education => [
                "Here is how it works",
                "Step one, set it up",
                "Step two, see the results",
            ],
            CampaignGoal::Recruitment => [
                "Join our team",
                "Grow with people who care",
                "Apply today",
            ],
        }
    }

    fn color_grading(goal: CampaignGoal) -> Value {
        match goal {
            CampaignGoal::Sales => json!({"color": {"brightness": 10, "contrast": 15, "saturation": 20}}),
            CampaignGoal::Awareness => json!({"color.saturation": 10, "vignette": {"amount": 0.2}}),
            CampaignGoal::Engagement => json!({"color": {"saturation": 25, "contrast": 10}}),
            CampaignGoal::Education => json!({"color": {"brightness": 5, "contrast": 5}}),
            CampaignGoal::Recruitment => json!({"color": {"temperature": 15, "brightness": 8}}),
        }
    }

    fn mood(audience: TargetAudience) -> &'static str {
        match audience {
            TargetAudience::YoungAdults => "energetic and optimistic",
            TargetAudience::Professionals => "confident and focused",
            TargetAudience::Families => "warm and reassuring",
            TargetAudience::Seniors => "calm and trustworthy",
            TargetAudience::Businesses => "credible and direct",
        }
    }

    fn caption_position(audience: TargetAudience) -> &'static str {
        match audience {
            TargetAudience::Seniors => "center",
            _ => "bottom",
        }
    }

    /// Build the payload for a request; times scale with the media duration
    pub fn build_payload(request: &AnalysisRequest) -> Value {
        let scale = request.duration / REFERENCE_DURATION;
        let at = |t: f64| ((t * scale) * 1000.0).round() / 1000.0;
        let goal = request.campaign_goal;
        let audience = request.target_audience;
        let reasons = Self::cut_reasons(goal);
        let captions = Self::captions(goal);
        let position = Self::caption_position(audience);

        json!({
            "id": format!(
                "template-{}-{}-{}",
                goal,
                audience,
                (request.duration * 1000.0).round() as u64
            ),
            "mood": Self::mood(audience),
            "emotions": ["joy", "excitement", "curiosity"],
            "keyMoments": [
                {"time": at(5.0), "description": "product reveal", "importance": "high"},
                {"time": at(15.0), "description": "audience reaction", "importance": "medium"},
                {"time": at(25.0), "description": "call to action", "importance": "high"}
            ],
            "suggestedCuts": [
                {"start": at(2.0), "end": at(8.0), "reason": reasons[0], "type": "highlight"},
                {"start": at(12.0), "end": at(20.0), "reason": reasons[1], "type": "highlight"}
            ],
            "subtitles": [
                {"start": at(0.0), "end": at(3.0), "text": captions[0], "position": position},
                {"start": at(3.0), "end": at(7.0), "text": captions[1], "position": position},
                {"start": at(7.0), "end": at(12.0), "text": captions[2], "position": position}
            ],
            "colorGrading": Self::color_grading(goal)
        })
    }
}

#[async_trait]
impl AnalysisPort for CampaignTemplateAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Value, DomainError> {
        if !request.duration.is_finite() || request.duration <= 0.0 {
            return Err(DomainError::AnalysisFailed(format!(
                "Cannot analyze media of duration {}",
                request.duration
            )));
        }
        tracing::info!(
            source = %request.source,
            goal = %request.campaign_goal,
            audience = %request.target_audience,
            "Running template analysis"
        );
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(Self::build_payload(request))
    }
}
