use backdrop_core::{BoidConfig, ConfigError, Field, FieldConfig, Flock, Rect};
use backdrop_shared::{merge_config, parse_boid_config, parse_field_config, parse_pointer, to_json_line};
use backdrop_shared::{BoidFrame, EngineStatus, FieldFrame, PointerState};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn config_error(engine: &str, err: ConfigError) -> JsValue {
    console_log!("{} config rejected: {}", engine, err);
    js_error(err)
}

/// CSS size of the canvas; the backing store is resized to match.
fn fit_canvas(canvas: &HtmlCanvasElement) -> (f32, f32) {
    let width = canvas.client_width().max(0) as u32;
    let height = canvas.client_height().max(0) as u32;
    canvas.set_width(width);
    canvas.set_height(height);
    (width as f32, height as f32)
}

fn boid_config_from(json: Option<String>) -> Result<BoidConfig, JsValue> {
    match json {
        Some(json) => parse_boid_config(&json).map_err(js_error),
        None => Ok(BoidConfig::default()),
    }
}

fn field_config_from(json: Option<String>) -> Result<FieldConfig, JsValue> {
    match json {
        Some(json) => parse_field_config(&json).map_err(js_error),
        None => Ok(FieldConfig::default()),
    }
}

/// Boid backdrop driven by the page's animation frame loop
#[wasm_bindgen]
pub struct BoidBackdrop {
    flock: Flock,
    pointer: PointerState,
    tick: u64,
}

#[wasm_bindgen]
impl BoidBackdrop {
    /// `config_json` may override any subset of the flock tunables.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32, config_json: Option<String>) -> Result<BoidBackdrop, JsValue> {
        let config = boid_config_from(config_json)?;
        let flock =
            Flock::from_entropy(width, height, config).map_err(|e| config_error("flock", e))?;
        console_log!("Initializing boid backdrop with {} boids", flock.boids().len());
        Ok(Self::wrap(flock))
    }

    /// Deterministic variant for reproducible captures.
    #[wasm_bindgen(js_name = withSeed)]
    pub fn with_seed(
        width: f32,
        height: f32,
        seed: u32,
        config_json: Option<String>,
    ) -> Result<BoidBackdrop, JsValue> {
        let config = boid_config_from(config_json)?;
        let flock = Flock::new(width, height, config, seed as u64)
            .map_err(|e| config_error("flock", e))?;
        Ok(Self::wrap(flock))
    }

    pub fn tick(&mut self) {
        self.flock.update(self.pointer.as_vector());
        if !self.flock.is_paused() {
            self.tick += 1;
        }
    }

    #[wasm_bindgen(js_name = setPointer)]
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = PointerState::at(x, y);
    }

    #[wasm_bindgen(js_name = clearPointer)]
    pub fn clear_pointer(&mut self) {
        self.pointer = PointerState::inactive();
    }

    /// Pointer message as posted by the page, e.g. `{"position":null}`.
    #[wasm_bindgen(js_name = applyPointerJson)]
    pub fn apply_pointer_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.pointer = parse_pointer(json).map_err(js_error)?;
        Ok(())
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.flock.resize(width, height);
        console_log!("Resized to {}x{} ({} boids)", width, height, self.flock.boids().len());
    }

    #[wasm_bindgen(js_name = fitToCanvas)]
    pub fn fit_to_canvas(&mut self, canvas: &HtmlCanvasElement) {
        let (width, height) = fit_canvas(canvas);
        self.resize(width, height);
    }

    #[wasm_bindgen(js_name = setPaused)]
    pub fn set_paused(&mut self, paused: bool) {
        self.flock.set_paused(paused);
    }

    #[wasm_bindgen(js_name = isPaused)]
    pub fn is_paused(&self) -> bool {
        self.flock.is_paused()
    }

    /// Reserve the hero-text rectangle; boids spawned later avoid it.
    #[wasm_bindgen(js_name = setExclusionZone)]
    pub fn set_exclusion_zone(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.flock
            .set_exclusion_zone(Some(Rect::new(x, y, width, height)));
    }

    #[wasm_bindgen(js_name = clearExclusionZone)]
    pub fn clear_exclusion_zone(&mut self) {
        self.flock.set_exclusion_zone(None);
    }

    /// Overlay a partial JSON config on the current one.
    #[wasm_bindgen(js_name = applyConfigJson)]
    pub fn apply_config_json(&mut self, json: &str) -> Result<(), JsValue> {
        let config = merge_config(self.flock.config(), json).map_err(js_error)?;
        self.flock
            .set_config(config)
            .map_err(|e| config_error("flock", e))
    }

    pub fn count(&self) -> usize {
        self.flock.boids().len()
    }

    /// Flat `[x, y, angle, speed]` per boid, in collection order.
    pub fn state(&self) -> Vec<f32> {
        self.flock
            .boids()
            .iter()
            .flat_map(|b| [b.position.x, b.position.y, b.angle, b.current_speed])
            .collect()
    }

    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        to_json_line(&BoidFrame::capture(self.tick, &self.flock)).map_err(js_error)
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        js_sys::JSON::parse(&self.snapshot_json()?)
    }

    #[wasm_bindgen(js_name = statusJson)]
    pub fn status_json(&self) -> Result<String, JsValue> {
        to_json_line(&EngineStatus::of_flock(&self.flock)).map_err(js_error)
    }
}

impl BoidBackdrop {
    fn wrap(flock: Flock) -> Self {
        Self {
            flock,
            pointer: PointerState::inactive(),
            tick: 0,
        }
    }
}

/// Floating-points backdrop: points, connection lines and mesh triangles
#[wasm_bindgen]
pub struct FieldBackdrop {
    field: Field,
    pointer: PointerState,
    tick: u64,
}

#[wasm_bindgen]
impl FieldBackdrop {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32, config_json: Option<String>) -> Result<FieldBackdrop, JsValue> {
        let config = field_config_from(config_json)?;
        let field =
            Field::from_entropy(width, height, config).map_err(|e| config_error("field", e))?;
        console_log!(
            "Initializing field backdrop with {} points (connection radius {:.1})",
            field.points().len(),
            field.connection_radius()
        );
        Ok(Self::wrap(field))
    }

    #[wasm_bindgen(js_name = withSeed)]
    pub fn with_seed(
        width: f32,
        height: f32,
        seed: u32,
        config_json: Option<String>,
    ) -> Result<FieldBackdrop, JsValue> {
        let config = field_config_from(config_json)?;
        let field = Field::new(width, height, config, seed as u64)
            .map_err(|e| config_error("field", e))?;
        Ok(Self::wrap(field))
    }

    pub fn tick(&mut self) {
        self.field.update(self.pointer.as_vector());
        if !self.field.is_paused() {
            self.tick += 1;
        }
    }

    #[wasm_bindgen(js_name = setPointer)]
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = PointerState::at(x, y);
    }

    #[wasm_bindgen(js_name = clearPointer)]
    pub fn clear_pointer(&mut self) {
        self.pointer = PointerState::inactive();
    }

    /// Pointer message as posted by the page, e.g. `{"position":null}`.
    #[wasm_bindgen(js_name = applyPointerJson)]
    pub fn apply_pointer_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.pointer = parse_pointer(json).map_err(js_error)?;
        Ok(())
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.field.resize(width, height);
        console_log!(
            "Resized to {}x{} ({} points, connection radius {:.1})",
            width,
            height,
            self.field.points().len(),
            self.field.connection_radius()
        );
    }

    #[wasm_bindgen(js_name = fitToCanvas)]
    pub fn fit_to_canvas(&mut self, canvas: &HtmlCanvasElement) {
        let (width, height) = fit_canvas(canvas);
        self.resize(width, height);
    }

    #[wasm_bindgen(js_name = setPaused)]
    pub fn set_paused(&mut self, paused: bool) {
        self.field.set_paused(paused);
    }

    #[wasm_bindgen(js_name = isPaused)]
    pub fn is_paused(&self) -> bool {
        self.field.is_paused()
    }

    #[wasm_bindgen(js_name = applyConfigJson)]
    pub fn apply_config_json(&mut self, json: &str) -> Result<(), JsValue> {
        let config = merge_config(self.field.config(), json).map_err(js_error)?;
        self.field
            .set_config(config)
            .map_err(|e| config_error("field", e))
    }

    pub fn count(&self) -> usize {
        self.field.points().len()
    }

    #[wasm_bindgen(js_name = connectionRadius)]
    pub fn connection_radius(&self) -> f32 {
        self.field.connection_radius()
    }

    /// Flat `[x, y]` draw positions (distortion applied), in collection order.
    pub fn positions(&self) -> Vec<f32> {
        self.field
            .points()
            .iter()
            .flat_map(|p| {
                let render = p.render_position();
                [render.x, render.y]
            })
            .collect()
    }

    /// Flat `[a, b]` index pairs into `positions`.
    pub fn connections(&self) -> Vec<u32> {
        self.field
            .connections()
            .iter()
            .flat_map(|c| [c.a as u32, c.b as u32])
            .collect()
    }

    /// Flat `[a, b, c]` index triples into `positions`.
    pub fn triangles(&self) -> Vec<u32> {
        self.field
            .triangles()
            .iter()
            .flat_map(|t| t.vertices.map(|v| v as u32))
            .collect()
    }

    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        to_json_line(&FieldFrame::capture(self.tick, &self.field)).map_err(js_error)
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        js_sys::JSON::parse(&self.snapshot_json()?)
    }

    #[wasm_bindgen(js_name = statusJson)]
    pub fn status_json(&self) -> Result<String, JsValue> {
        to_json_line(&EngineStatus::of_field(&self.field)).map_err(js_error)
    }
}

impl FieldBackdrop {
    fn wrap(field: Field) -> Self {
        Self {
            field,
            pointer: PointerState::inactive(),
            tick: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only paths that never touch a JS import run natively.

    #[test]
    fn test_boid_state_layout() {
        let mut backdrop = BoidBackdrop::wrap(
            Flock::new(400.0, 300.0, BoidConfig::default(), 4).unwrap(),
        );
        backdrop.set_pointer(200.0, 150.0);
        backdrop.tick();
        backdrop.clear_pointer();
        backdrop.tick();
        assert_eq!(backdrop.pointer, PointerState::inactive());

        let state = backdrop.state();
        assert_eq!(state.len(), backdrop.count() * 4);
        assert_eq!(backdrop.tick, 2);
    }

    #[test]
    fn test_paused_ticks_not_counted() {
        let mut backdrop = FieldBackdrop::wrap(
            Field::new(400.0, 300.0, FieldConfig::default(), 4).unwrap(),
        );
        backdrop.set_paused(true);
        backdrop.tick();
        assert_eq!(backdrop.tick, 0);
        assert!(backdrop.is_paused());
    }

    #[test]
    fn test_field_buffers_index_positions() {
        let mut backdrop = FieldBackdrop::wrap(
            Field::new(600.0, 400.0, FieldConfig::default(), 4).unwrap(),
        );
        backdrop.tick();

        let points = backdrop.positions().len() / 2;
        assert_eq!(points, backdrop.count());

        let connections = backdrop.connections();
        assert_eq!(connections.len() % 2, 0);
        assert!(connections.iter().all(|&i| (i as usize) < points));

        let triangles = backdrop.triangles();
        assert_eq!(triangles.len() % 3, 0);
        assert!(triangles.iter().all(|&i| (i as usize) < points));
    }

    #[test]
    fn test_pointer_json_drives_field() {
        let mut backdrop = FieldBackdrop::wrap(
            Field::new(600.0, 400.0, FieldConfig::interactive(), 4).unwrap(),
        );
        backdrop
            .apply_pointer_json(r#"{"position":{"x":300.0,"y":200.0}}"#)
            .unwrap();
        assert_eq!(backdrop.pointer, PointerState::at(300.0, 200.0));
        backdrop.tick();

        backdrop.apply_pointer_json(r#"{"position":null}"#).unwrap();
        assert_eq!(backdrop.pointer.as_vector(), None);
    }
}
