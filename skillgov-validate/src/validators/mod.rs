mod admissibility;
mod coherence;
mod effect_safety;
mod feasibility;
mod institutional;

pub use admissibility::Admissibility;
pub use coherence::Coherence;
pub use effect_safety::EffectSafety;
pub use feasibility::ContextFeasibility;
pub use institutional::Institutional;
