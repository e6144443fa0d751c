//! WGSL shaders for the Strata GPU backend
//!
//! - `step`: one generation of the rule, buffer A -> B or B -> A
//! - `brush`: circular stamp into the current layer
//! - `composite`: greyscale view of any stored layer
//!
//! All three address cells packed four to a `u32` word, little-endian, with
//! each layer starting on a word boundary.

pub mod brush;
pub mod composite;
pub mod step;

pub use brush::BRUSH_TEMPLATE;
pub use composite::COMPOSITE_SHADER;
pub use step::STEP_TEMPLATE;

/// Placeholder substituted with the configured workgroup size
const WORKGROUP_SIZE_SLOT: &str = "{{WORKGROUP_SIZE}}";

/// Instantiate a compute template for a workgroup size
pub fn generate_shader(template: &str, workgroup_size: u32) -> String {
    template.replace(WORKGROUP_SIZE_SLOT, &workgroup_size.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_fully_instantiated() {
        for template in [STEP_TEMPLATE, BRUSH_TEMPLATE] {
            let source = generate_shader(template, 64);
            assert!(source.contains("@workgroup_size(64)"));
            assert!(!source.contains("{{"));
        }
    }
}
