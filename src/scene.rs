use std::collections::HashMap;

use glam::Vec3;
use log::warn;

use crate::drawable::{Drawable, Material, Model, ModelId};
use crate::error::{ConfigurationDefect, SetupError};
use crate::light::{Light, LightId};

/// Every light, model and drawable known to the renderer.
///
/// Lights keep their registration order, which decides blend order in the
/// frame loop. Drawables refer to lights by [`LightId`], never by position.
#[derive(Debug, Default)]
pub struct Scene {
    lights: Vec<Light>,
    models: Vec<Model>,
    lit: Vec<Drawable>,
    shadow_casters: Vec<Drawable>,
    offsets: HashMap<String, Vec3>,
    next_light: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the id for the next light to be registered.
    pub fn next_light_id(&self) -> LightId {
        LightId::new(self.next_light)
    }

    /// Appends a light; it is drawn after every light registered before it.
    pub fn add_light(&mut self, light: Light) -> Result<LightId, SetupError> {
        let id = light.id();
        if self.light(id).is_some() {
            return Err(SetupError::DuplicateLight(id));
        }
        self.next_light = self.next_light.max(id.raw() + 1);
        self.lights.push(light);
        Ok(id)
    }

    pub fn add_model(&mut self, model: Model) -> ModelId {
        self.models.push(model);
        ModelId(self.models.len() - 1)
    }

    pub fn add_lit_drawable(&mut self, drawable: Drawable) {
        self.lit.push(drawable);
    }

    pub fn add_shadow_caster(&mut self, drawable: Drawable) {
        self.shadow_casters.push(drawable);
    }

    /// Registers the lit drawable and its depth-only counterpart for `light`.
    pub fn add_drawable_pair(&mut self, model: ModelId, light: LightId, material: Material) {
        self.add_lit_drawable(Drawable::lit(model, light, material));
        self.add_shadow_caster(Drawable::shadow_caster(model, light));
    }

    /// Offset applied on top of the frame translation to the model named `name`.
    pub fn set_offset(&mut self, name: impl Into<String>, offset: Vec3) {
        self.offsets.insert(name.into(), offset);
    }

    pub fn offset(&self, name: &str) -> Vec3 {
        self.offsets.get(name).copied().unwrap_or(Vec3::ZERO)
    }

    /// Spins every animated model about Y and moves it to `translation`
    /// plus its configured offset.
    pub fn animate_models(&mut self, delta_time: f32, spin_speed: f32, translation: Vec3) {
        for model in self.models.iter_mut().filter(|model| model.animated) {
            model.transform.rotate.y += spin_speed * delta_time;
            let offset = self.offsets.get(&model.name).copied().unwrap_or(Vec3::ZERO);
            model.transform.translate = translation + offset;
        }
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.iter().find(|light| light.id() == id)
    }

    /// Position of `id` in the draw order.
    pub fn light_position(&self, id: LightId) -> Option<usize> {
        self.lights.iter().position(|light| light.id() == id)
    }

    pub(crate) fn light_at_mut(&mut self, position: usize) -> &mut Light {
        &mut self.lights[position]
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id.0)
    }

    pub fn model_by_name(&self, name: &str) -> Option<(ModelId, &Model)> {
        self.models
            .iter()
            .enumerate()
            .find(|(_, model)| model.name == name)
            .map(|(index, model)| (ModelId(index), model))
    }

    pub fn lit_drawables(&self) -> &[Drawable] {
        &self.lit
    }

    pub fn shadow_casters(&self) -> &[Drawable] {
        &self.shadow_casters
    }

    pub fn lit_drawables_for(&self, light: LightId) -> impl Iterator<Item = &Drawable> + '_ {
        self.lit.iter().filter(move |drawable| drawable.is_bound_to(light))
    }

    pub fn shadow_casters_for(&self, light: LightId) -> impl Iterator<Item = &Drawable> + '_ {
        self.shadow_casters
            .iter()
            .filter(move |drawable| drawable.is_bound_to(light))
    }

    /// Lists wiring mistakes the frame loop would silently skip over.
    pub fn audit(&self) -> Vec<ConfigurationDefect> {
        let mut defects = Vec::new();
        let passes = [("lit", &self.lit), ("shadow", &self.shadow_casters)];
        for (pass, drawables) in passes {
            for drawable in drawables.iter() {
                let Some(model) = self.model(drawable.model) else {
                    defects.push(ConfigurationDefect::UnknownModel {
                        pass,
                        model: drawable.model.0,
                    });
                    continue;
                };
                if self.light(drawable.light).is_none() {
                    defects.push(ConfigurationDefect::UnknownLight {
                        pass,
                        model: model.name.clone(),
                        light: drawable.light,
                    });
                }
            }
        }

        for drawable in &self.lit {
            let has_caster = self
                .shadow_casters
                .iter()
                .any(|caster| caster.model == drawable.model && caster.light == drawable.light);
            if !has_caster {
                let model = self
                    .model(drawable.model)
                    .map(|model| model.name.clone())
                    .unwrap_or_else(|| format!("#{}", drawable.model.0));
                defects.push(ConfigurationDefect::MissingShadowCaster {
                    model,
                    light: drawable.light,
                });
            }
        }

        for defect in &defects {
            warn!("scene audit: {defect}");
        }
        defects
    }
}
