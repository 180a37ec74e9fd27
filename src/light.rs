use std::fmt;

use glam::{Mat4, Quat, Vec3};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::render::{FramebufferId, GraphicsContext, ShadowMapId};
use crate::transform::Transform;

/// Stable identifier of a registered light. Drawables bind to lights by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LightId(u32);

impl LightId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "light #{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    #[default]
    Directional,
    Point,
}

/// Construction parameters for a [`Light`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    pub kind: LightKind,
    pub intensity: f32,
    pub color: Vec3,
    pub position: Vec3,
    pub focal_point: Vec3,
    pub up: Vec3,
    pub has_shadow_map: bool,
    /// Orbit speed around `focal_point`, in degrees per second.
    pub orbit_speed_degrees: f32,
    pub shadow_resolution: u32,
    /// Half width of the orthographic shadow volume of a directional light.
    pub shadow_extent: f32,
    pub shadow_near: f32,
    pub shadow_far: f32,
    /// Edge length of the emissive marker cube drawn at the light position.
    pub marker_scale: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            kind: LightKind::Directional,
            intensity: 2500.0,
            color: Vec3::ONE,
            position: Vec3::new(0.0, 80.0, 80.0),
            focal_point: Vec3::ZERO,
            up: Vec3::Y,
            has_shadow_map: true,
            orbit_speed_degrees: 10.0,
            shadow_resolution: Light::DEFAULT_SHADOW_RESOLUTION,
            shadow_extent: 150.0,
            shadow_near: 0.01,
            shadow_far: 500.0,
            marker_scale: 2.0,
        }
    }
}

/// Shadow-casting light that orbits its focal point.
#[derive(Debug, Clone)]
pub struct Light {
    id: LightId,
    kind: LightKind,
    intensity: f32,
    color: Vec3,
    position: Vec3,
    focal_point: Vec3,
    up: Vec3,
    angular_speed: f32,
    marker_scale: f32,
    shadow_map: Option<ShadowMapId>,
    shadow_resolution: u32,
    projection: Mat4,
    view_projection: Mat4,
}

impl Light {
    pub const DEFAULT_SHADOW_RESOLUTION: u32 = 2048;

    /// Creates the light and, when it casts shadows, allocates its shadow
    /// framebuffer. Allocation failure is reported here rather than at draw time.
    pub fn new<C>(id: LightId, settings: &LightSettings, ctx: &mut C) -> Result<Self, SetupError>
    where
        C: GraphicsContext + ?Sized,
    {
        let up = settings.up.normalize_or_zero();
        if up == Vec3::ZERO {
            return Err(SetupError::InvalidLight(format!("{id} has a zero up vector")));
        }
        let offset = settings.position - settings.focal_point;
        if offset.length_squared() <= f32::EPSILON {
            return Err(SetupError::InvalidLight(format!(
                "{id} is positioned on its focal point"
            )));
        }
        if offset.normalize().cross(up).length_squared() <= 1e-8 {
            return Err(SetupError::InvalidLight(format!(
                "{id} looks along its up vector"
            )));
        }
        if !(settings.shadow_near > 0.0 && settings.shadow_far > settings.shadow_near) {
            return Err(SetupError::InvalidLight(format!(
                "{id} has an empty shadow depth range ({}..{})",
                settings.shadow_near, settings.shadow_far
            )));
        }
        if settings.kind == LightKind::Directional
            && !(settings.shadow_extent > 0.0 && settings.shadow_extent.is_finite())
        {
            return Err(SetupError::InvalidLight(format!(
                "{id} has a degenerate shadow extent ({})",
                settings.shadow_extent
            )));
        }

        let shadow_map = if settings.has_shadow_map {
            Some(ctx.create_shadow_framebuffer(settings.shadow_resolution)?)
        } else {
            None
        };

        let projection = match settings.kind {
            LightKind::Directional => {
                let extent = settings.shadow_extent;
                Mat4::orthographic_rh(
                    -extent,
                    extent,
                    -extent,
                    extent,
                    settings.shadow_near,
                    settings.shadow_far,
                )
            }
            LightKind::Point => Mat4::perspective_rh(
                std::f32::consts::FRAC_PI_2,
                1.0,
                settings.shadow_near,
                settings.shadow_far,
            ),
        };

        let mut light = Self {
            id,
            kind: settings.kind,
            intensity: settings.intensity,
            color: settings.color,
            position: settings.position,
            focal_point: settings.focal_point,
            up,
            angular_speed: settings.orbit_speed_degrees.to_radians(),
            marker_scale: settings.marker_scale,
            shadow_map,
            shadow_resolution: settings.shadow_resolution,
            projection,
            view_projection: Mat4::IDENTITY,
        };
        light.refresh_view_projection();
        info!(
            "created {id} ({:?}) at {:?}, shadow map: {}",
            light.kind,
            light.position,
            if light.shadow_map.is_some() { "yes" } else { "no" }
        );
        Ok(light)
    }

    /// Rotates the light about its focal point around the up axis.
    ///
    /// Each call moves the light further; invoke exactly once per frame.
    pub fn advance(&mut self, delta_time: f32) {
        let rotation = Quat::from_axis_angle(self.up, self.angular_speed * delta_time);
        self.position = self.focal_point + rotation * (self.position - self.focal_point);
        self.refresh_view_projection();
    }

    /// Recomputes the cached view-projection from the current position.
    pub fn refresh_view_projection(&mut self) {
        self.view_projection = self.projection * self.view_matrix();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.focal_point, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    /// Light-space MVP of an object: `projection * view * model`.
    pub fn light_space_matrix(&self, transform: &Transform) -> Mat4 {
        self.view_projection * transform.to_model_matrix()
    }

    /// Transform of the emissive marker cube at the light's current position.
    pub fn marker_transform(&self) -> Transform {
        Transform::from_translation(self.position).with_scale(Vec3::splat(self.marker_scale))
    }

    pub fn shadow_framebuffer(&self) -> Option<FramebufferId> {
        self.shadow_map.map(FramebufferId::Shadow)
    }

    pub fn shadow_map(&self) -> Option<ShadowMapId> {
        self.shadow_map
    }

    pub fn has_shadow_map(&self) -> bool {
        self.shadow_map.is_some()
    }

    pub fn shadow_resolution(&self) -> u32 {
        self.shadow_resolution
    }

    pub fn id(&self) -> LightId {
        self.id
    }

    pub fn kind(&self) -> LightKind {
        self.kind
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn focal_point(&self) -> Vec3 {
        self.focal_point
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingContext;

    fn light(settings: LightSettings) -> Light {
        let mut ctx = RecordingContext::new();
        Light::new(LightId::new(0), &settings, &mut ctx).unwrap()
    }

    #[test]
    fn advance_keeps_orbit_radius() {
        let mut light = light(LightSettings {
            position: Vec3::new(12.0, 40.0, -7.0),
            focal_point: Vec3::new(1.0, 2.0, 3.0),
            orbit_speed_degrees: 37.0,
            ..LightSettings::default()
        });
        let radius = (light.position() - light.focal_point()).length();
        for _ in 0..1000 {
            light.advance(1.0 / 60.0);
            let current = (light.position() - light.focal_point()).length();
            assert!((current - radius).abs() < 1e-2 * radius.max(1.0));
        }
    }

    #[test]
    fn advance_rotates_about_up_axis() {
        let mut light = light(LightSettings {
            position: Vec3::new(0.0, 80.0, 80.0),
            orbit_speed_degrees: 90.0,
            ..LightSettings::default()
        });
        light.advance(1.0);
        assert!((light.position() - Vec3::new(80.0, 80.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn light_space_matrix_is_repeatable() {
        let light = light(LightSettings::default());
        let transform = Transform::new(Vec3::new(3.0, 1.0, -2.0), Vec3::new(0.1, 0.5, 0.0), Vec3::splat(4.0));
        assert_eq!(
            light.light_space_matrix(&transform),
            light.light_space_matrix(&transform)
        );
    }

    #[test]
    fn light_space_matrix_tracks_current_position() {
        let mut light = light(LightSettings::default());
        let transform = Transform::default();
        let before = light.light_space_matrix(&transform);
        light.advance(0.5);
        let after = light.light_space_matrix(&transform);
        assert!(!before.abs_diff_eq(after, 1e-4));
        let expected = light.projection_matrix()
            * Mat4::look_at_rh(light.position(), light.focal_point(), light.up());
        assert!(after.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn focal_point_projects_inside_shadow_volume() {
        for kind in [LightKind::Directional, LightKind::Point] {
            let light = light(LightSettings {
                kind,
                ..LightSettings::default()
            });
            let clip = light.view_projection() * light.focal_point().extend(1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4, "{kind:?}: {ndc:?}");
            assert!(ndc.z > 0.0 && ndc.z < 1.0, "{kind:?}: {ndc:?}");
        }
    }

    #[test]
    fn shadowless_light_allocates_nothing() {
        let mut ctx = RecordingContext::new();
        let settings = LightSettings {
            has_shadow_map: false,
            ..LightSettings::default()
        };
        let light = Light::new(LightId::new(3), &settings, &mut ctx).unwrap();
        assert!(light.shadow_framebuffer().is_none());
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn failed_shadow_allocation_is_a_setup_error() {
        let mut ctx = RecordingContext::failing_shadow_allocation();
        let result = Light::new(LightId::new(0), &LightSettings::default(), &mut ctx);
        assert!(matches!(
            result,
            Err(SetupError::ShadowFramebuffer { resolution: 2048, .. })
        ));
    }

    #[test]
    fn rejects_degenerate_orientation() {
        let mut ctx = RecordingContext::new();
        let settings = LightSettings {
            position: Vec3::new(0.0, 50.0, 0.0),
            ..LightSettings::default()
        };
        assert!(matches!(
            Light::new(LightId::new(0), &settings, &mut ctx),
            Err(SetupError::InvalidLight(_))
        ));
    }

    #[test]
    fn rejects_degenerate_shadow_extent() {
        let mut ctx = RecordingContext::new();
        for extent in [0.0, -5.0, f32::INFINITY, f32::NAN] {
            let settings = LightSettings {
                shadow_extent: extent,
                ..LightSettings::default()
            };
            assert!(matches!(
                Light::new(LightId::new(0), &settings, &mut ctx),
                Err(SetupError::InvalidLight(_))
            ));
        }
        let light = Light::new(LightId::new(0), &LightSettings::default(), &mut ctx).unwrap();
        assert!(light.light_space_matrix(&Transform::default()).is_finite());
    }
}
