use bytemuck::{Pod, Zeroable};

pub const PRESENT_SOURCE: &str = include_str!("present.wgsl");

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct Uniforms {
    /// Linear RGB background, alpha unused.
    pub background: [f32; 4],
}

impl Uniforms {
    /// Uniforms for an sRGB background colour.
    pub fn from_srgb(rgb: [f32; 3]) -> Self {
        let [r, g, b] = rgb.map(srgb_to_linear);
        Self {
            background: [r, g, b, 1.0],
        }
    }
}

/// The swapchain is sRGB, so the shader works in linear space.
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_present_shader_is_valid() {
        validate_wgsl(PRESENT_SOURCE).expect("present shader should be valid WGSL");
    }

    #[test]
    fn test_present_shader_entry_points() {
        assert!(PRESENT_SOURCE.contains("fn vs_main"));
        assert!(PRESENT_SOURCE.contains("fn fs_main"));
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<Uniforms>(), 16);
    }

    #[test]
    fn test_srgb_conversion_endpoints() {
        let u = Uniforms::from_srgb([0.0, 1.0, 0.5]);
        assert_eq!(u.background[0], 0.0);
        assert!((u.background[1] - 1.0).abs() < 1e-5);
        assert!((u.background[2] - 0.214).abs() < 1e-3);
        assert_eq!(u.background[3], 1.0);
    }
}
