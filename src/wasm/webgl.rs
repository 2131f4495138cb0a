use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    window, HtmlCanvasElement, MouseEvent, WebGl2RenderingContext as GL, WebGlProgram, WebGlShader,
    WebGlUniformLocation,
};

use super::{dom, render};
use crate::config::ShaderConfig;
use crate::shader::{self, FrameInputs};

struct Uniforms {
    resolution: Option<WebGlUniformLocation>,
    time: Option<WebGlUniformLocation>,
    pointer: Option<WebGlUniformLocation>,
    colors: [Option<WebGlUniformLocation>; 3],
}

impl Uniforms {
    fn locate(gl: &GL, program: &WebGlProgram) -> Self {
        let at = |name: &str| gl.get_uniform_location(program, name);
        Self {
            resolution: at("u_resolution"),
            time: at("u_time"),
            pointer: at("u_pointer"),
            colors: [at("u_color0"), at("u_color1"), at("u_color2")],
        }
    }

    fn upload(&self, gl: &GL, inputs: &FrameInputs) {
        gl.uniform2f(self.resolution.as_ref(), inputs.resolution.x, inputs.resolution.y);
        gl.uniform1f(self.time.as_ref(), inputs.time);
        let p = inputs.pointer_uniform();
        gl.uniform2f(self.pointer.as_ref(), p.x, p.y);
        for (loc, c) in self.colors.iter().zip(inputs.colors) {
            gl.uniform3f(loc.as_ref(), c[0], c[1], c[2]);
        }
    }
}

/// Noise field rendered entirely in a fragment shader.
pub fn start(canvas: HtmlCanvasElement, config: ShaderConfig) -> Result<(), JsValue> {
    let gl: GL = canvas
        .get_context("webgl2")?
        .ok_or("WebGL2 not supported")?
        .dyn_into()?;

    let program = link(&gl, shader::VERTEX_SRC, shader::FRAGMENT_SRC)?;
    gl.use_program(Some(&program));

    let vao = gl.create_vertex_array().ok_or("could not create vertex array")?;
    gl.bind_vertex_array(Some(&vao));
    let buffer = gl.create_buffer().ok_or("could not create buffer")?;
    gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
    let quad = js_sys::Float32Array::from(&shader::QUAD[..]);
    gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &quad, GL::STATIC_DRAW);
    let position = gl.get_attrib_location(&program, "a_position");
    if position < 0 {
        return Err("a_position attribute missing".into());
    }
    gl.enable_vertex_attrib_array(position as u32);
    gl.vertex_attrib_pointer_with_i32(position as u32, 2, GL::FLOAT, false, 0, 0);

    let uniforms = Uniforms::locate(&gl, &program);

    let size = Rc::new(Cell::new(render::fit_canvas(&canvas)?));
    gl.viewport(0, 0, size.get().0 as i32, size.get().1 as i32);
    // Stored in CSS pixels; normalized when the frame is built.
    let pointer: Rc<Cell<Option<Vec2>>> = Rc::new(Cell::new(None));

    let win = window().ok_or("no window")?;
    {
        let size = size.clone();
        dom::listen(&win, "resize", move |_| match render::fit_canvas(&canvas) {
            Ok(s) => size.set(s),
            Err(err) => log::warn!("resize failed: {:?}", err),
        })?;
    }
    {
        let pointer = pointer.clone();
        dom::listen(&win, "mousemove", move |e| {
            if let Some(e) = e.dyn_ref::<MouseEvent>() {
                pointer.set(Some(Vec2::new(e.client_x() as f32, e.client_y() as f32)));
            }
        })?;
    }
    {
        let pointer = pointer.clone();
        dom::listen(&win, "mouseout", move |e| {
            if e.dyn_ref::<MouseEvent>().is_some_and(|e| e.related_target().is_none()) {
                pointer.set(None);
            }
        })?;
    }

    let mut origin: Option<f64> = None;
    render::animate(move |now| {
        let start = *origin.get_or_insert(now);
        let (w, h) = size.get();
        gl.viewport(0, 0, w as i32, h as i32);
        let normalized = pointer
            .get()
            .and_then(|p| shader::normalize_pointer(p.x, p.y, w, h));
        let inputs = FrameInputs::new(
            &config,
            Vec2::new(w, h),
            ((now - start) / 1000.0) as f32,
            normalized,
        );
        uniforms.upload(&gl, &inputs);
        gl.draw_arrays(GL::TRIANGLES, 0, 6);
    })
}

fn compile(gl: &GL, kind: u32, src: &str) -> Result<WebGlShader, JsValue> {
    let shader = gl.create_shader(kind).ok_or("could not create shader")?;
    gl.shader_source(&shader, src);
    gl.compile_shader(&shader);
    if gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let info = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(JsValue::from_str(&format!("shader compile failed: {info}")))
    }
}

fn link(gl: &GL, vertex: &str, fragment: &str) -> Result<WebGlProgram, JsValue> {
    let vs = compile(gl, GL::VERTEX_SHADER, vertex)?;
    let fs = compile(gl, GL::FRAGMENT_SHADER, fragment)?;
    let program = gl.create_program().ok_or("could not create program")?;
    gl.attach_shader(&program, &vs);
    gl.attach_shader(&program, &fs);
    gl.link_program(&program);
    if gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        let info = gl.get_program_info_log(&program).unwrap_or_default();
        Err(JsValue::from_str(&format!("program link failed: {info}")))
    }
}
