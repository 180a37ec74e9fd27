use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use glam::{Vec3, Vec4};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::camera::CameraSettings;
use crate::drawable::Material;
use crate::geometry::Shape;
use crate::light::{LightKind, LightSettings};
use crate::shadow::ShadowTechnique;
use crate::transform::Transform;

/// Per-frame parameters coming from the GUI/config provider.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameParams {
    /// Translation applied to every animated model (`modelTransX/Y/Z`).
    pub model_translation: Vec3,
    /// Shadow filtering mode (`shadowClass`).
    pub shadow_technique: ShadowTechnique,
}

/// Where the geometry of a model comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometrySource {
    /// OBJ file, relative to the scene file.
    Mesh(PathBuf),
    Shape(Shape),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub name: String,
    pub source: GeometrySource,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub material: Material,
    #[serde(default)]
    pub animated: bool,
    /// Offset added to the frame translation while animated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Vec3>,
}

/// Everything needed to build a renderer: camera, lights, models and the
/// initial frame parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub camera: CameraSettings,
    pub frame: FrameParams,
    pub background: Vec4,
    pub lights: Vec<LightSettings>,
    pub models: Vec<ModelSettings>,
}

impl Default for SceneDescription {
    /// Two orbiting directional lights over a floor with two spinning cubes.
    fn default() -> Self {
        let first = LightSettings {
            position: Vec3::new(0.0, 80.0, 80.0),
            orbit_speed_degrees: 10.0,
            ..LightSettings::default()
        };
        let second = LightSettings {
            position: Vec3::new(90.0, 90.0, 0.0),
            orbit_speed_degrees: 80.0,
            ..LightSettings::default()
        };
        Self {
            camera: CameraSettings::default(),
            frame: FrameParams::default(),
            background: Vec4::new(0.0, 0.0, 0.0, 1.0),
            lights: vec![first, second],
            models: vec![
                ModelSettings {
                    name: "primary".to_string(),
                    source: GeometrySource::Shape(Shape::Cube),
                    transform: Transform::default().with_scale(Vec3::splat(20.0)),
                    material: Material {
                        base_color: Vec3::new(0.9, 0.6, 0.4),
                        ..Material::default()
                    },
                    animated: true,
                    offset: None,
                },
                ModelSettings {
                    name: "secondary".to_string(),
                    source: GeometrySource::Shape(Shape::Cube),
                    transform: Transform::from_translation(Vec3::new(40.0, 0.0, -40.0))
                        .with_scale(Vec3::splat(10.0)),
                    material: Material {
                        base_color: Vec3::new(0.4, 0.6, 0.9),
                        ..Material::default()
                    },
                    animated: true,
                    offset: Some(Vec3::new(0.0, 0.0, -50.0)),
                },
                ModelSettings {
                    name: "floor".to_string(),
                    source: GeometrySource::Shape(Shape::Plane),
                    transform: Transform::from_translation(Vec3::new(0.0, -10.0, -30.0))
                        .with_scale(Vec3::splat(240.0)),
                    material: Material::default(),
                    animated: false,
                    offset: None,
                },
            ],
        }
    }
}

impl SceneDescription {
    /// Parses a scene description document.
    ///
    /// Colors are written as `r g b` in the 0-255 range and rotations in
    /// degrees. Any omitted element keeps its default.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        if !root.has_tag_name("scene") {
            return Err(anyhow!(
                "expected <scene> root element, found <{}>",
                root.tag_name().name()
            ));
        }

        let mut description = Self {
            lights: Vec::new(),
            models: Vec::new(),
            ..Self::default()
        };

        if let Some(camera) = child(&root, "camera") {
            description.camera = parse_camera(&camera).context("invalid <camera>")?;
        }
        if let Some(settings) = child(&root, "settings") {
            parse_settings(&settings, &mut description).context("invalid <settings>")?;
        }
        for (index, node) in root.children().filter(|n| n.has_tag_name("light")).enumerate() {
            let light = parse_light(&node).with_context(|| format!("invalid <light> #{index}"))?;
            description.lights.push(light);
        }
        for (index, node) in root.children().filter(|n| n.has_tag_name("model")).enumerate() {
            let model = parse_model(&node).with_context(|| format!("invalid <model> #{index}"))?;
            description.models.push(model);
        }
        Ok(description)
    }
}

fn parse_camera(node: &Node<'_, '_>) -> Result<CameraSettings> {
    let defaults = CameraSettings::default();
    Ok(CameraSettings {
        position: parse_vec3(optional_text(node, "position"), defaults.position)?,
        target: parse_vec3(optional_text(node, "target"), defaults.target)?,
        up: parse_vec3(optional_text(node, "up"), defaults.up)?,
        fov_degrees: parse_f32(optional_text(node, "fov"), defaults.fov_degrees)?,
        near: parse_f32(optional_text(node, "near"), defaults.near)?,
        far: parse_f32(optional_text(node, "far"), defaults.far)?,
    })
}

fn parse_settings(node: &Node<'_, '_>, description: &mut SceneDescription) -> Result<()> {
    if let Some(shadow) = optional_text(node, "shadow") {
        description.frame.shadow_technique = shadow.parse()?;
    }
    description.frame.model_translation =
        parse_vec3(optional_text(node, "translate"), description.frame.model_translation)?;
    let background = parse_color(
        optional_text(node, "background"),
        description.background.truncate(),
    )?;
    description.background = background.extend(1.0);
    Ok(())
}

fn parse_light(node: &Node<'_, '_>) -> Result<LightSettings> {
    let defaults = LightSettings::default();
    let kind = match optional_text(node, "kind").as_deref() {
        None | Some("directional") => LightKind::Directional,
        Some("point") => LightKind::Point,
        Some(other) => return Err(anyhow!("unknown light kind `{other}`")),
    };
    Ok(LightSettings {
        kind,
        intensity: parse_f32(optional_text(node, "intensity"), defaults.intensity)?,
        color: parse_color(optional_text(node, "color"), defaults.color)?,
        position: parse_vec3(optional_text(node, "position"), defaults.position)?,
        focal_point: parse_vec3(optional_text(node, "focal"), defaults.focal_point)?,
        up: parse_vec3(optional_text(node, "up"), defaults.up)?,
        has_shadow_map: parse_bool(optional_text(node, "shadow"), defaults.has_shadow_map)?,
        orbit_speed_degrees: parse_f32(optional_text(node, "speed"), defaults.orbit_speed_degrees)?,
        shadow_resolution: parse_u32(
            optional_text(node, "resolution"),
            defaults.shadow_resolution,
        )?,
        shadow_extent: parse_f32(optional_text(node, "extent"), defaults.shadow_extent)?,
        shadow_near: parse_f32(optional_text(node, "near"), defaults.shadow_near)?,
        shadow_far: parse_f32(optional_text(node, "far"), defaults.shadow_far)?,
        marker_scale: parse_f32(optional_text(node, "marker"), defaults.marker_scale)?,
    })
}

fn parse_model(node: &Node<'_, '_>) -> Result<ModelSettings> {
    let name = required_text(node, "name")?;
    let source = match (optional_text(node, "mesh"), optional_text(node, "shape")) {
        (Some(path), None) => GeometrySource::Mesh(PathBuf::from(path)),
        (None, Some(shape)) => GeometrySource::Shape(match shape.as_str() {
            "cube" => Shape::Cube,
            "plane" => Shape::Plane,
            other => return Err(anyhow!("unknown shape `{other}`")),
        }),
        (Some(_), Some(_)) => return Err(anyhow!("<mesh> and <shape> are mutually exclusive")),
        (None, None) => return Err(anyhow!("<mesh> or <shape> is required")),
    };
    let rotation_degrees = parse_vec3(optional_text(node, "rotation"), Vec3::ZERO)?;
    let transform = Transform::new(
        parse_vec3(optional_text(node, "position"), Vec3::ZERO)?,
        Vec3::new(
            rotation_degrees.x.to_radians(),
            rotation_degrees.y.to_radians(),
            rotation_degrees.z.to_radians(),
        ),
        parse_vec3(optional_text(node, "scale"), Vec3::ONE)?,
    );
    let defaults = Material::default();
    let material = Material {
        base_color: parse_color(optional_text(node, "color"), defaults.base_color)?,
        specular: parse_color(optional_text(node, "specular"), defaults.specular)?,
    };
    let offset = match optional_text(node, "offset") {
        Some(text) => Some(parse_vec3(Some(text), Vec3::ZERO)?),
        None => None,
    };
    Ok(ModelSettings {
        name,
        source,
        transform,
        material,
        animated: parse_bool(optional_text(node, "animated"), false)?,
        offset,
    })
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

/// Parses `x y z`; commas are accepted as separators too.
pub fn parse_vec3_text(value: &str) -> Result<Vec3> {
    let components = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f32>()
                .map_err(|err| anyhow!("invalid vector component `{part}`: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match components.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        other => Err(anyhow!(
            "vector needs 3 components, found {}",
            other.len()
        )),
    }
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    match value {
        Some(value) => parse_vec3_text(&value),
        None => Ok(default),
    }
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let color = parse_vec3_text(&value).context("invalid color")?;
    Ok(color / 255.0)
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}

fn parse_u32(value: Option<String>, default: u32) -> Result<u32> {
    match value {
        Some(value) => value
            .parse::<u32>()
            .map_err(|err| anyhow!("failed to parse integer: {err}")),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref() {
        Some("true" | "yes" | "1") => Ok(true),
        Some("false" | "no" | "0") => Ok(false),
        Some(other) => Err(anyhow!("failed to parse boolean `{other}`")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene>
        <camera>
            <position>0 10 40</position>
            <fov>60</fov>
        </camera>
        <settings>
            <shadow>PCF</shadow>
            <translate>1 2 3</translate>
        </settings>
        <light>
            <kind>point</kind>
            <intensity>900</intensity>
            <position>0 50 50</position>
            <speed>45</speed>
            <shadow>false</shadow>
            <color>255 128 0</color>
        </light>
        <light>
            <position>90 90 0</position>
            <resolution>1024</resolution>
        </light>
        <model>
            <name>statue</name>
            <mesh>models/statue.obj</mesh>
            <scale>20 20 20</scale>
            <rotation>0 90 0</rotation>
            <animated>true</animated>
            <offset>0 0 -50</offset>
        </model>
        <model>
            <name>floor</name>
            <shape>plane</shape>
        </model>
    </scene>
    "#;

    #[test]
    fn parse_scene_populates_lights_and_models() {
        let scene = SceneDescription::from_xml(SAMPLE).unwrap();
        assert_eq!(scene.camera.position, Vec3::new(0.0, 10.0, 40.0));
        assert_eq!(scene.camera.fov_degrees, 60.0);
        assert_eq!(scene.frame.shadow_technique, ShadowTechnique::Pcf);
        assert_eq!(scene.frame.model_translation, Vec3::new(1.0, 2.0, 3.0));

        assert_eq!(scene.lights.len(), 2);
        let point = &scene.lights[0];
        assert_eq!(point.kind, LightKind::Point);
        assert!(!point.has_shadow_map);
        assert_eq!(point.orbit_speed_degrees, 45.0);
        assert_eq!(point.color, Vec3::new(1.0, 128.0 / 255.0, 0.0));
        assert_eq!(scene.lights[1].shadow_resolution, 1024);
        assert!(scene.lights[1].has_shadow_map);

        assert_eq!(scene.models.len(), 2);
        let statue = &scene.models[0];
        assert_eq!(statue.source, GeometrySource::Mesh(PathBuf::from("models/statue.obj")));
        assert!(statue.animated);
        assert_eq!(statue.offset, Some(Vec3::new(0.0, 0.0, -50.0)));
        assert!((statue.transform.rotate.y - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(scene.models[1].source, GeometrySource::Shape(Shape::Plane));
        assert!(!scene.models[1].animated);
    }

    #[test]
    fn missing_model_name_is_an_error() {
        let bad = "<scene><model><shape>cube</shape></model></scene>";
        assert!(SceneDescription::from_xml(bad).is_err());
    }

    #[test]
    fn unknown_shadow_mode_is_an_error() {
        let bad = "<scene><settings><shadow>VSM</shadow></settings></scene>";
        assert!(SceneDescription::from_xml(bad).is_err());
    }

    #[test]
    fn vectors_accept_commas() {
        assert_eq!(parse_vec3_text("1, -2,3.5").unwrap(), Vec3::new(1.0, -2.0, 3.5));
        assert!(parse_vec3_text("1 2").is_err());
    }

    #[test]
    fn default_scene_matches_two_light_demo() {
        let scene = SceneDescription::default();
        assert_eq!(scene.lights.len(), 2);
        assert_eq!(scene.lights[0].orbit_speed_degrees, 10.0);
        assert_eq!(scene.lights[1].orbit_speed_degrees, 80.0);
        assert_eq!(scene.frame.shadow_technique, ShadowTechnique::Pcss);
        assert_eq!(scene.models.iter().filter(|m| m.animated).count(), 2);
    }
}
