//! Recipes: named, serializable step lists that expand into timelines.
//!
//! A step selects its targets by role name ("logo", "items", ...). Hosts bind
//! roles to elements with [`Roles`]; an unbound role yields no targets, which
//! keeps the step's slot in the schedule but animates nothing.

use anyhow::{Context, Result};
use folio_motion_core::{
    easing::Curve, AnimationSpec, Direction, Easing, LoopPolicy, Position, PropertyTween,
    RandomSource, Stage, StaggerOptions, Targets, Timeline, ValueSource,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Role name → elements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Roles(IndexMap<String, Targets>);

impl Roles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role: impl Into<String>, targets: impl Into<Targets>) -> Self {
        self.insert(role, targets);
        self
    }

    pub fn insert(&mut self, role: impl Into<String>, targets: impl Into<Targets>) {
        self.0.insert(role.into(), targets.into());
    }

    pub fn get(&self, role: &str) -> Option<&Targets> {
        self.0.get(role)
    }

    pub fn resolve(&self, role: &str) -> Targets {
        self.0.get(role).cloned().unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    /// Role name resolved through [`Roles`].
    pub select: String,
    pub spec: AnimationSpec,
    #[serde(default, skip_serializing_if = "is_after_previous")]
    pub position: Position,
}

fn is_after_previous(p: &Position) -> bool {
    *p == Position::AfterPrevious
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub steps: Vec<RecipeStep>,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, select: &str, spec: AnimationSpec, position: Position) -> Self {
        self.steps.push(RecipeStep {
            select: select.to_string(),
            spec,
            position,
        });
        self
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let recipe: Recipe = serde_json::from_str(s).context("parse recipe JSON")?;
        for (i, step) in recipe.steps.iter().enumerate() {
            step.spec
                .validate()
                .with_context(|| format!("recipe '{}' step {i}", recipe.name))?;
        }
        Ok(recipe)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize recipe")
    }

    /// Expand into an unplayed timeline against the given role bindings.
    pub fn timeline(&self, roles: &Roles) -> Timeline {
        let mut tl = Timeline::new();
        for step in &self.steps {
            tl.push(roles.resolve(&step.select), step.spec.clone(), step.position);
        }
        tl
    }

    /// Scheduled length at the given speed multiplier.
    pub fn duration_ms(&self, roles: &Roles, speed: f64) -> f64 {
        self.timeline(roles).duration_ms(speed)
    }

    /// Jump every bound target to the state the animation would end in. Used
    /// when the engine cannot run the recipe so content still ends up visible.
    /// A step ending on an unset `from` leaves the current value alone.
    pub fn apply_final(&self, roles: &Roles, stage: &mut dyn Stage, rng: &mut dyn RandomSource) {
        for step in &self.steps {
            let at_start = step.spec.ends_at_start();
            for target in roles.resolve(&step.select).iter() {
                for (name, tween) in &step.spec.properties {
                    let end = if at_start { tween.from.as_ref() } else { Some(&tween.to) };
                    if let Some(source) = end {
                        stage.write(target, name, source.evaluate(rng));
                    }
                }
            }
        }
    }

    /// Logo reveal for the loading screen.
    pub fn loader_entrance() -> Self {
        Recipe::new("loader-entrance")
            .step(
                "logo",
                AnimationSpec::new()
                    .prop("opacity", PropertyTween::from_to(0.0, 1.0))
                    .prop("scale", PropertyTween::from_to(0.6, 1.0))
                    .duration(800.0)
                    .easing(Easing::Out(Curve::Back)),
                Position::AfterPrevious,
            )
            .step(
                "tagline",
                AnimationSpec::new()
                    .prop("opacity", PropertyTween::from_to(0.0, 1.0))
                    .prop("translateY", PropertyTween::from_to("12px", "0px"))
                    .duration(500.0)
                    .easing(Easing::Out(Curve::Cubic)),
                Position::Overlap(300.0),
            )
    }

    /// Progress driver: a single 0→100 tween on the bar.
    pub fn loader_progress() -> AnimationSpec {
        AnimationSpec::new()
            .prop("progress", PropertyTween::from_to(0.0, 100.0))
            .duration(2000.0)
            .easing(Easing::InOut(Curve::Sine))
    }

    /// Fade and scale out, then withdraw the region.
    pub fn loader_exit() -> Self {
        Recipe::new("loader-exit")
            .step(
                "logo",
                AnimationSpec::new()
                    .prop("opacity", PropertyTween::from_to(1.0, 0.0))
                    .prop("scale", PropertyTween::from_to(1.0, 1.2))
                    .duration(500.0)
                    .easing(Easing::In(Curve::Quad)),
                Position::AfterPrevious,
            )
            .step(
                "region",
                AnimationSpec::new()
                    .prop("opacity", PropertyTween::from_to(1.0, 0.0))
                    .duration(400.0)
                    .easing(Easing::Linear),
                Position::Overlap(200.0),
            )
    }

    /// Section reveal used by scroll regions.
    pub fn fade_up() -> Self {
        Recipe::new("fade-up").step(
            "items",
            AnimationSpec::new()
                .prop("opacity", PropertyTween::from_to(0.0, 1.0))
                .prop("translateY", PropertyTween::from_to("40px", "0px"))
                .duration(800.0)
                .easing(Easing::Out(Curve::Expo)),
            Position::AfterPrevious,
        )
    }

    /// Cascading card entrance.
    pub fn stagger_in() -> Self {
        Recipe::new("stagger-in").step(
            "items",
            AnimationSpec::new()
                .prop("opacity", PropertyTween::from_to(0.0, 1.0))
                .prop("scale", PropertyTween::from_to(0.8, 1.0))
                .duration(600.0)
                .easing(Easing::Out(Curve::Cubic))
                .stagger(80.0, StaggerOptions::default()),
            Position::AfterPrevious,
        )
    }

    /// Endless blob morph for decorative shapes.
    pub fn morph_loop() -> AnimationSpec {
        AnimationSpec::new()
            .prop("borderRadius", PropertyTween::from_to("30%", "50%"))
            .prop("rotate", PropertyTween::from_to("0deg", "45deg"))
            .prop(
                "scale",
                PropertyTween::from_to(1.0, ValueSource::random(0.9, 1.15)),
            )
            .duration(4000.0)
            .easing(Easing::InOut(Curve::Sine))
            .looping(LoopPolicy::Infinite)
            .direction(Direction::Alternate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_motion_core::{ElementId, HeadlessStage, Value};

    /// Always returns the lower bound.
    struct Fixed;

    impl RandomSource for Fixed {
        fn uniform(&mut self, min: f64, _max: f64) -> f64 {
            min
        }
    }

    #[test]
    fn json_roundtrip_keeps_positions() {
        let recipe = Recipe::loader_entrance();
        let json = recipe.to_json().unwrap();
        let back = Recipe::from_json(&json).unwrap();
        assert_eq!(back, recipe);
        assert_eq!(back.steps[1].position, Position::Overlap(300.0));
    }

    #[test]
    fn timeline_uses_roles_and_schedule() {
        let roles = Roles::new()
            .with("logo", ElementId(1))
            .with("tagline", ElementId(2));
        let tl = Recipe::loader_entrance().timeline(&roles);
        assert_eq!(tl.len(), 2);
        assert_eq!(tl.steps()[0].targets, Targets::from(ElementId(1)));
        let schedule = tl.schedule(1.0);
        assert_eq!(schedule[1].start_ms, 500.0);
        assert_eq!(Recipe::loader_entrance().duration_ms(&roles, 1.0), 1000.0);
    }

    #[test]
    fn unbound_roles_animate_nothing() {
        let tl = Recipe::fade_up().timeline(&Roles::new());
        assert!(tl.steps()[0].targets.is_empty());
    }

    #[test]
    fn apply_final_writes_end_values() {
        let mut stage = HeadlessStage::new();
        let items: Vec<ElementId> = (0..2).map(|_| stage.create_root("li")).collect();
        let roles = Roles::new().with("items", items.clone());
        Recipe::fade_up().apply_final(&roles, &mut stage, &mut Fixed);
        for el in items {
            assert_eq!(stage.read(el, "opacity"), Some(Value::Float(1.0)));
            assert_eq!(stage.read(el, "translateY"), Some(Value::from("0px")));
        }
    }

    #[test]
    fn apply_final_respects_direction() {
        let mut stage = HeadlessStage::new();
        let el = stage.create_root("div");
        stage.write(el, "scale", Value::Float(0.5));
        let recipe = Recipe::new("swing")
            .step(
                "a",
                AnimationSpec::new()
                    .prop("opacity", PropertyTween::from_to(0.2, 1.0))
                    .direction(Direction::Reverse),
                Position::AfterPrevious,
            )
            .step(
                "a",
                AnimationSpec::new()
                    .prop("rotate", PropertyTween::from_to("0deg", "90deg"))
                    .prop("scale", PropertyTween::to(2.0))
                    .direction(Direction::Alternate)
                    .looping(LoopPolicy::Times(2)),
                Position::AfterPrevious,
            );
        recipe.apply_final(&Roles::new().with("a", el), &mut stage, &mut Fixed);
        assert_eq!(stage.read(el, "opacity"), Some(Value::Float(0.2)));
        assert_eq!(stage.read(el, "rotate"), Some(Value::from("0deg")));
        assert_eq!(stage.read(el, "scale"), Some(Value::Float(0.5)));
    }

    #[test]
    fn invalid_step_is_rejected() {
        let json = r#"{"name":"bad","steps":[{"select":"x","spec":{"duration":-1}}]}"#;
        assert!(Recipe::from_json(json).is_err());
    }
}
