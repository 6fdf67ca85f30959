//! Effect pipeline: named, range-checked parameters per category and the pure
//! mapping from (parameters, time) to resolved rendering attributes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Film grain pattern refresh rate used to derive the noise seed
const GRAIN_REFRESH_HZ: f64 = 24.0;

/// Effect parameter categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectCategory {
    Color,
    Transform,
    Blur,
    Noise,
    Vignette,
}

impl EffectCategory {
    pub const ALL: [EffectCategory; 5] = [
        EffectCategory::Color,
        EffectCategory::Transform,
        EffectCategory::Blur,
        EffectCategory::Noise,
        EffectCategory::Vignette,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectCategory::Color => "color",
            EffectCategory::Transform => "transform",
            EffectCategory::Blur => "blur",
            EffectCategory::Noise => "noise",
            EffectCategory::Vignette => "vignette",
        }
    }

    /// Parse category from string
    pub fn parse(category: &str) -> Result<Self, DomainError> {
        match category.trim().to_lowercase().as_str() {
            "color" | "colour" | "color_correction" | "grading" => Ok(EffectCategory::Color),
            "transform" => Ok(EffectCategory::Transform),
            "blur" => Ok(EffectCategory::Blur),
            "noise" | "grain" => Ok(EffectCategory::Noise),
            "vignette" => Ok(EffectCategory::Vignette),
            other => Err(DomainError::BadArgs(format!(
                "Invalid effect category: {}. Valid categories: color, transform, blur, noise, vignette",
                other
            ))),
        }
    }
}

impl fmt::Display for EffectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter value: numeric or one of a fixed set of options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Float(f64),
    Choice(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Choice(_) => None,
        }
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            ParamValue::Choice(s) => Some(s),
            ParamValue::Float(_) => None,
        }
    }

    /// Numeric if the text parses as a number, otherwise a choice
    pub fn parse(value: &str) -> Self {
        match value.trim().parse::<f64>() {
            Ok(v) => ParamValue::Float(v),
            Err(_) => ParamValue::Choice(value.trim().to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Choice(s) => f.write_str(s),
        }
    }
}

/// Declared type and range of a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Float { min: f64, max: f64, default: f64 },
    Choice {
        options: &'static [&'static str],
        default: &'static str,
    },
}

/// Definition of a single effect parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDef {
    pub category: EffectCategory,
    pub name: &'static str,
    pub kind: ParamKind,
}

const fn float(category: EffectCategory, name: &'static str, min: f64, max: f64, default: f64) -> ParamDef {
    ParamDef {
        category,
        name,
        kind: ParamKind::Float { min, max, default },
    }
}

const fn choice(
    category: EffectCategory,
    name: &'static str,
    options: &'static [&'static str],
    default: &'static str,
) -> ParamDef {
    ParamDef {
        category,
        name,
        kind: ParamKind::Choice { options, default },
    }
}

/// Every parameter the pipeline knows about
pub const PARAM_DEFS: &[ParamDef] = &[
    float(EffectCategory::Color, "brightness", -100.0, 100.0, 0.0),
    float(EffectCategory::Color, "contrast", -100.0, 100.0, 0.0),
    float(EffectCategory::Color, "saturation", -100.0, 100.0, 0.0),
    float(EffectCategory::Color, "hue", -180.0, 180.0, 0.0),
    float(EffectCategory::Color, "temperature", -100.0, 100.0, 0.0),
    float(EffectCategory::Color, "exposure", -3.0, 3.0, 0.0),
    float(EffectCategory::Transform, "scale", 0.1, 4.0, 1.0),
    float(EffectCategory::Transform, "rotation", -180.0, 180.0, 0.0),
    float(EffectCategory::Transform, "offset_x", -1.0, 1.0, 0.0),
    float(EffectCategory::Transform, "offset_y", -1.0, 1.0, 0.0),
    float(EffectCategory::Transform, "opacity", 0.0, 1.0, 1.0),
    choice(
        EffectCategory::Transform,
        "flip",
        &["none", "horizontal", "vertical"],
        "none",
    ),
    float(EffectCategory::Blur, "radius", 0.0, 50.0, 0.0),
    float(EffectCategory::Blur, "angle", 0.0, 360.0, 0.0),
    choice(
        EffectCategory::Blur,
        "mode",
        &["gaussian", "motion", "radial"],
        "gaussian",
    ),
    float(EffectCategory::Noise, "amount", 0.0, 1.0, 0.0),
    float(EffectCategory::Noise, "grain_size", 0.5, 4.0, 1.0),
    float(EffectCategory::Vignette, "amount", 0.0, 1.0, 0.0),
    float(EffectCategory::Vignette, "feather", 0.0, 1.0, 0.5),
];

impl ParamDef {
    /// Fully-qualified key, `category.name`
    pub fn key(&self) -> String {
        format!("{}.{}", self.category, self.name)
    }

    pub fn default_value(&self) -> ParamValue {
        match self.kind {
            ParamKind::Float { default, .. } => ParamValue::Float(default),
            ParamKind::Choice { default, .. } => ParamValue::Choice(default.to_string()),
        }
    }

    /// Strict validation used by explicit edits
    pub fn validate(&self, value: &ParamValue) -> Result<ParamValue, DomainError> {
        match (&self.kind, value) {
            (ParamKind::Float { min, max, .. }, ParamValue::Float(v)) => {
                if !v.is_finite() || *v < *min || *v > *max {
                    return Err(DomainError::OutOfRange {
                        parameter: self.key(),
                        value: *v,
                        min: *min,
                        max: *max,
                    });
                }
                Ok(ParamValue::Float(*v))
            }
            (ParamKind::Choice { options, .. }, ParamValue::Choice(s)) => {
                let normalized = s.to_lowercase();
                if options.contains(&normalized.as_str()) {
                    Ok(ParamValue::Choice(normalized))
                } else {
                    Err(DomainError::ParameterTypeMismatch {
                        parameter: self.key(),
                        expected: format!("one of {}", options.join(", ")),
                    })
                }
            }
            (ParamKind::Float { .. }, ParamValue::Choice(_)) => {
                Err(DomainError::ParameterTypeMismatch {
                    parameter: self.key(),
                    expected: "a number".to_string(),
                })
            }
            (ParamKind::Choice { options, .. }, ParamValue::Float(_)) => {
                Err(DomainError::ParameterTypeMismatch {
                    parameter: self.key(),
                    expected: format!("one of {}", options.join(", ")),
                })
            }
        }
    }

    /// Lenient coercion used for machine deltas and clip overrides.
    /// Returns the stored value and whether it had to be clamped.
    fn coerce(&self, value: &ParamValue) -> Option<(ParamValue, bool)> {
        match (&self.kind, value) {
            (ParamKind::Float { min, max, .. }, ParamValue::Float(v)) if v.is_finite() => {
                let clamped = v.clamp(*min, *max);
                Some((ParamValue::Float(clamped), clamped != *v))
            }
            (ParamKind::Choice { .. }, ParamValue::Choice(_)) => {
                self.validate(value).ok().map(|v| (v, false))
            }
            _ => None,
        }
    }
}

/// Look up a parameter by category and name
pub fn lookup(category: EffectCategory, name: &str) -> Option<&'static ParamDef> {
    PARAM_DEFS
        .iter()
        .find(|d| d.category == category && d.name == name)
}

/// Look up a parameter by `category.name`, or by bare name when unique
pub fn lookup_key(key: &str) -> Option<&'static ParamDef> {
    let key = key.trim();
    if let Some((category, name)) = key.split_once('.') {
        let category = EffectCategory::parse(category).ok()?;
        return lookup(category, name);
    }
    let mut matches = PARAM_DEFS.iter().filter(|d| d.name == key);
    match (matches.next(), matches.next()) {
        (Some(def), None) => Some(def),
        _ => None,
    }
}

/// Result of applying a partial parameter update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeltaOutcome {
    pub applied: usize,
    pub ignored: usize,
    pub clamped: usize,
}

/// Current effect parameter state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectPipeline {
    values: BTreeMap<EffectCategory, BTreeMap<String, ParamValue>>,
}

impl Default for EffectPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectPipeline {
    /// Pipeline with every parameter at its default
    pub fn new() -> Self {
        let mut values: BTreeMap<EffectCategory, BTreeMap<String, ParamValue>> = BTreeMap::new();
        for def in PARAM_DEFS {
            values
                .entry(def.category)
                .or_default()
                .insert(def.name.to_string(), def.default_value());
        }
        Self { values }
    }

    /// Set one parameter. Fails without mutation if the value is not allowed.
    pub fn set_parameter(
        &mut self,
        category: EffectCategory,
        name: &str,
        value: ParamValue,
    ) -> Result<ParamValue, DomainError> {
        let def = lookup(category, name)
            .ok_or_else(|| DomainError::UnknownParameter(format!("{}.{}", category, name)))?;
        let stored = def.validate(&value)?;
        self.store(def, stored.clone());
        tracing::debug!(parameter = %def.key(), value = %stored, "Effect parameter set");
        Ok(stored)
    }

    /// Current value, falling back to the declared default
    pub fn get(&self, category: EffectCategory, name: &str) -> Option<ParamValue> {
        let def = lookup(category, name)?;
        Some(
            self.values
                .get(&category)
                .and_then(|m| m.get(name))
                .cloned()
                .unwrap_or_else(|| def.default_value()),
        )
    }

    fn float(&self, category: EffectCategory, name: &str) -> f64 {
        self.get(category, name)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    fn choice(&self, category: EffectCategory, name: &str) -> String {
        self.get(category, name)
            .and_then(|v| v.as_choice().map(str::to_string))
            .unwrap_or_default()
    }

    fn store(&mut self, def: &ParamDef, value: ParamValue) {
        self.values
            .entry(def.category)
            .or_default()
            .insert(def.name.to_string(), value);
    }

    /// Restore every parameter in a category to its default
    pub fn reset_category(&mut self, category: EffectCategory) {
        for def in PARAM_DEFS.iter().filter(|d| d.category == category) {
            self.store(def, def.default_value());
        }
    }

    pub fn reset_all(&mut self) {
        *self = Self::new();
    }

    /// Whether every parameter is at its default
    pub fn is_default(&self) -> bool {
        PARAM_DEFS
            .iter()
            .all(|def| self.get(def.category, def.name) == Some(def.default_value()))
    }

    /// All parameters as (`category.name`, value), in declaration order
    pub fn entries(&self) -> Vec<(String, ParamValue)> {
        PARAM_DEFS
            .iter()
            .filter_map(|def| self.get(def.category, def.name).map(|v| (def.key(), v)))
            .collect()
    }

    /// Apply a partial update from an untrusted source.
    ///
    /// Keys are `category.name`, a unique bare name, or a category holding a
    /// nested object. Unknown keys and wrongly-typed values are ignored and
    /// counted; out-of-range numbers are clamped. Commits all or nothing.
    pub fn apply_delta(&mut self, delta: &serde_json::Map<String, serde_json::Value>) -> DeltaOutcome {
        let mut staged = self.clone();
        let mut outcome = DeltaOutcome::default();

        for (key, value) in delta {
            if let serde_json::Value::Object(nested) = value {
                match EffectCategory::parse(key) {
                    Ok(category) => {
                        for (name, nested_value) in nested {
                            let def = lookup(category, name);
                            staged.stage(def, nested_value, &mut outcome);
                        }
                    }
                    Err(_) => outcome.ignored += nested.len().max(1),
                }
                continue;
            }
            staged.stage(lookup_key(key), value, &mut outcome);
        }

        *self = staged;
        outcome
    }

    fn stage(
        &mut self,
        def: Option<&'static ParamDef>,
        value: &serde_json::Value,
        outcome: &mut DeltaOutcome,
    ) {
        let Some(def) = def else {
            outcome.ignored += 1;
            return;
        };
        let candidate = match value {
            serde_json::Value::Number(n) => n.as_f64().map(ParamValue::Float),
            serde_json::Value::String(s) => Some(ParamValue::Choice(s.clone())),
            _ => None,
        };
        match candidate.and_then(|c| def.coerce(&c)) {
            Some((stored, was_clamped)) => {
                self.store(def, stored);
                outcome.applied += 1;
                if was_clamped {
                    outcome.clamped += 1;
                }
            }
            None => outcome.ignored += 1,
        }
    }

    /// Resolve rendering attributes at `time`
    pub fn resolve(&self, time: f64) -> RenderAttributes {
        RenderAttributes::from_pipeline(self, time)
    }

    /// Resolve with per-clip `category.name` overrides layered on top.
    /// Unknown or invalid overrides are skipped; numbers are clamped.
    pub fn resolve_with_overrides(
        &self,
        time: f64,
        overrides: &BTreeMap<String, ParamValue>,
    ) -> RenderAttributes {
        if overrides.is_empty() {
            return self.resolve(time);
        }
        let mut effective = self.clone();
        for (key, value) in overrides {
            if let Some(def) = lookup_key(key) {
                if let Some((stored, _)) = def.coerce(value) {
                    effective.store(def, stored);
                }
            }
        }
        effective.resolve(time)
    }
}

/// Blur stage of the resolved frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlurAttributes {
    pub radius: f64,
    pub mode: String,
    pub angle: f64,
}

/// Film grain stage of the resolved frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrainAttributes {
    pub amount: f64,
    pub size: f64,
    pub seed: u64,
}

/// Vignette stage of the resolved frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VignetteAttributes {
    pub amount: f64,
    pub feather: f64,
}

/// Rendering attributes resolved for one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderAttributes {
    pub time: f64,
    /// Multipliers, 1.0 = unchanged
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    /// Degrees
    pub hue_rotate: f64,
    /// -1.0 (cool) to 1.0 (warm)
    pub temperature: f64,
    pub scale: f64,
    pub rotation: f64,
    pub translate: (f64, f64),
    pub opacity: f64,
    pub flip: String,
    pub blur: Option<BlurAttributes>,
    pub grain: Option<GrainAttributes>,
    pub vignette: Option<VignetteAttributes>,
}

impl RenderAttributes {
    fn from_pipeline(p: &EffectPipeline, time: f64) -> Self {
        use EffectCategory::*;

        let exposure_gain = 2f64.powf(p.float(Color, "exposure"));
        let blur_radius = p.float(Blur, "radius");
        let grain_amount = p.float(Noise, "amount");
        let vignette_amount = p.float(Vignette, "amount");
        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };

        Self {
            time,
            brightness: (1.0 + p.float(Color, "brightness") / 100.0) * exposure_gain,
            contrast: 1.0 + p.float(Color, "contrast") / 100.0,
            saturation: 1.0 + p.float(Color, "saturation") / 100.0,
            hue_rotate: p.float(Color, "hue"),
            temperature: p.float(Color, "temperature") / 100.0,
            scale: p.float(Transform, "scale"),
            rotation: p.float(Transform, "rotation"),
            translate: (p.float(Transform, "offset_x"), p.float(Transform, "offset_y")),
            opacity: p.float(Transform, "opacity"),
            flip: p.choice(Transform, "flip"),
            blur: (blur_radius > 0.0).then(|| BlurAttributes {
                radius: blur_radius,
                mode: p.choice(Blur, "mode"),
                angle: p.float(Blur, "angle"),
            }),
            grain: (grain_amount > 0.0).then(|| GrainAttributes {
                amount: grain_amount,
                size: p.float(Noise, "grain_size"),
                seed: (time * GRAIN_REFRESH_HZ).floor() as u64,
            }),
            vignette: (vignette_amount > 0.0).then(|| VignetteAttributes {
                amount: vignette_amount,
                feather: p.float(Vignette, "feather"),
            }),
        }
    }

    /// CSS-style filter chain for renderers that accept one
    pub fn css_filter(&self) -> String {
        let mut parts = vec![
            format!("brightness({:.3})", self.brightness),
            format!("contrast({:.3})", self.contrast),
            format!("saturate({:.3})", self.saturation),
        ];
        if self.hue_rotate != 0.0 {
            parts.push(format!("hue-rotate({:.1}deg)", self.hue_rotate));
        }
        if let Some(blur) = &self.blur {
            if blur.mode == "gaussian" {
                parts.push(format!("blur({:.1}px)", blur.radius));
            }
        }
        if self.opacity < 1.0 {
            parts.push(format!("opacity({:.3})", self.opacity));
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_defaults_resolve_to_identity() {
        let pipeline = EffectPipeline::new();
        assert!(pipeline.is_default());
        let attrs = pipeline.resolve(3.0);
        assert_eq!(attrs.brightness, 1.0);
        assert_eq!(attrs.contrast, 1.0);
        assert_eq!(attrs.scale, 1.0);
        assert_eq!(attrs.opacity, 1.0);
        assert_eq!(attrs.flip, "none");
        assert!(attrs.blur.is_none());
        assert!(attrs.grain.is_none());
        assert_eq!(
            attrs.css_filter(),
            "brightness(1.000) contrast(1.000) saturate(1.000)"
        );
    }

    #[test]
    fn test_set_parameter_range_checks() {
        let mut pipeline = EffectPipeline::new();
        let stored = pipeline
            .set_parameter(EffectCategory::Color, "brightness", ParamValue::Float(100.0))
            .unwrap();
        assert_eq!(stored, ParamValue::Float(100.0));

        let err = pipeline
            .set_parameter(EffectCategory::Color, "brightness", ParamValue::Float(100.5))
            .unwrap_err();
        assert!(matches!(err, DomainError::OutOfRange { .. }));
        // Failed set leaves the old value
        assert_eq!(
            pipeline.get(EffectCategory::Color, "brightness"),
            Some(ParamValue::Float(100.0))
        );

        assert!(matches!(
            pipeline.set_parameter(EffectCategory::Blur, "sharpness", ParamValue::Float(1.0)),
            Err(DomainError::UnknownParameter(_))
        ));
        assert!(matches!(
            pipeline.set_parameter(
                EffectCategory::Blur,
                "mode",
                ParamValue::Choice("zoom".to_string())
            ),
            Err(DomainError::ParameterTypeMismatch { .. })
        ));
        assert!(matches!(
            pipeline.set_parameter(EffectCategory::Blur, "radius", ParamValue::Float(f64::NAN)),
            Err(DomainError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_apply_delta_counts_ignored_and_clamped() {
        let mut pipeline = EffectPipeline::new();
        let delta = as_map(json!({
            "brightness": 10,
            "color.contrast": 250,
            "sharpness": 3,
            "amount": 0.5,
            "vignette": { "amount": 0.4, "glow": 1 },
            "saturation": "lots"
        }));
        let outcome = pipeline.apply_delta(&delta);

        // brightness, contrast (clamped), vignette.amount
        assert_eq!(outcome.applied, 3);
        assert_eq!(outcome.clamped, 1);
        // sharpness, ambiguous "amount", vignette.glow, non-numeric saturation
        assert_eq!(outcome.ignored, 4);
        assert_eq!(
            pipeline.get(EffectCategory::Color, "contrast"),
            Some(ParamValue::Float(100.0))
        );
        assert_eq!(
            pipeline.get(EffectCategory::Vignette, "amount"),
            Some(ParamValue::Float(0.4))
        );
        assert_eq!(
            pipeline.get(EffectCategory::Color, "saturation"),
            Some(ParamValue::Float(0.0))
        );
    }

    #[test]
    fn test_resolve_combines_color_terms() {
        let mut pipeline = EffectPipeline::new();
        pipeline
            .set_parameter(EffectCategory::Color, "brightness", ParamValue::Float(20.0))
            .unwrap();
        pipeline
            .set_parameter(EffectCategory::Color, "exposure", ParamValue::Float(1.0))
            .unwrap();
        pipeline
            .set_parameter(EffectCategory::Blur, "radius", ParamValue::Float(4.0))
            .unwrap();
        let attrs = pipeline.resolve(0.0);
        assert!((attrs.brightness - 2.4).abs() < 1e-9);
        assert!(attrs.css_filter().contains("blur(4.0px)"));
    }

    #[test]
    fn test_grain_seed_follows_time() {
        let mut pipeline = EffectPipeline::new();
        pipeline
            .set_parameter(EffectCategory::Noise, "amount", ParamValue::Float(0.3))
            .unwrap();
        let a = pipeline.resolve(1.0).grain.unwrap().seed;
        let b = pipeline.resolve(1.01).grain.unwrap().seed;
        let c = pipeline.resolve(2.0).grain.unwrap().seed;
        assert_eq!(a, b);
        assert_ne!(a, c);
        // Pure: same inputs, same output
        assert_eq!(pipeline.resolve(1.5), pipeline.resolve(1.5));
    }

    #[test]
    fn test_overrides_layer_on_top() {
        let pipeline = EffectPipeline::new();
        let mut overrides = BTreeMap::new();
        overrides.insert("transform.opacity".to_string(), ParamValue::Float(7.0));
        overrides.insert("text.position".to_string(), ParamValue::Choice("top".to_string()));
        let attrs = pipeline.resolve_with_overrides(0.0, &overrides);
        assert_eq!(attrs.opacity, 1.0);

        overrides.insert("transform.opacity".to_string(), ParamValue::Float(0.5));
        let attrs = pipeline.resolve_with_overrides(0.0, &overrides);
        assert_eq!(attrs.opacity, 0.5);
        // Pipeline itself untouched
        assert!(pipeline.is_default());
    }

    #[test]
    fn test_reset_category() {
        let mut pipeline = EffectPipeline::new();
        pipeline
            .set_parameter(EffectCategory::Transform, "scale", ParamValue::Float(2.0))
            .unwrap();
        pipeline.reset_category(EffectCategory::Transform);
        assert!(pipeline.is_default());
    }

    #[test]
    fn test_lookup_key() {
        assert_eq!(lookup_key("color.hue").unwrap().name, "hue");
        assert_eq!(lookup_key("feather").unwrap().category, EffectCategory::Vignette);
        assert!(lookup_key("amount").is_none());
        assert!(lookup_key("bogus.hue").is_none());
    }
}
