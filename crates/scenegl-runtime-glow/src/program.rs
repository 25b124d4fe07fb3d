use glow::HasContext;

use scenegl_core::EngineError;

/// Compile and link a vertex/fragment program. Shader objects are always deleted; the program
/// is deleted again if linking fails.
pub unsafe fn compile_program(
    gl: &glow::Context,
    vert_src: &str,
    frag_src: &str,
) -> Result<glow::NativeProgram, EngineError> {
    let vs = compile_shader(gl, glow::VERTEX_SHADER, vert_src).map_err(EngineError::VertexCompile)?;
    let fs = match compile_shader(gl, glow::FRAGMENT_SHADER, frag_src) {
        Ok(fs) => fs,
        Err(log) => {
            gl.delete_shader(vs);
            return Err(EngineError::FragmentCompile(log));
        }
    };

    let stages = [vs, fs];
    let linked = link(gl, &stages);
    for shader in stages {
        gl.delete_shader(shader);
    }
    linked
}

/// Link `stages` into a new program, detaching them again whatever the outcome.
unsafe fn link(
    gl: &glow::Context,
    stages: &[glow::NativeShader],
) -> Result<glow::NativeProgram, EngineError> {
    let program = gl
        .create_program()
        .map_err(|e| EngineError::GlCreate(format!("create_program failed: {e:?}")))?;
    for &shader in stages {
        gl.attach_shader(program, shader);
    }
    gl.link_program(program);
    for &shader in stages {
        gl.detach_shader(program, shader);
    }

    if gl.get_program_link_status(program) {
        return Ok(program);
    }
    let log = gl.get_program_info_log(program);
    gl.delete_program(program);
    Err(EngineError::Link(log))
}

/// Returns the info log on failure.
unsafe fn compile_shader(
    gl: &glow::Context,
    stage: u32,
    src: &str,
) -> Result<glow::NativeShader, String> {
    let shader = gl
        .create_shader(stage)
        .map_err(|e| format!("create_shader(0x{stage:x}) failed: {e:?}"))?;
    gl.shader_source(shader, src);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(log);
    }
    Ok(shader)
}

/// One oversized triangle covering the viewport: position at location 0, uv at location 1.
#[derive(Debug)]
pub struct FullscreenTriangle {
    vao: glow::NativeVertexArray,
    vbo: glow::NativeBuffer,
}

impl FullscreenTriangle {
    pub unsafe fn new(gl: &glow::Context) -> Result<Self, EngineError> {
        let verts: [f32; 12] = [
            -1.0, -1.0, 0.0, 0.0, //
            3.0, -1.0, 2.0, 0.0, //
            -1.0, 3.0, 0.0, 2.0,
        ];

        let vao = gl
            .create_vertex_array()
            .map_err(|e| EngineError::GlCreate(format!("create_vertex_array: {e}")))?;
        let vbo = match gl.create_buffer() {
            Ok(vbo) => vbo,
            Err(e) => {
                gl.delete_vertex_array(vao);
                return Err(EngineError::GlCreate(format!("create_buffer: {e}")));
            }
        };

        gl.bind_vertex_array(Some(vao));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(&verts[..]),
            glow::STATIC_DRAW,
        );

        let stride = (4 * std::mem::size_of::<f32>()) as i32;
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, stride, 0);
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, stride, 2 * 4);

        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        gl.bind_vertex_array(None);

        Ok(Self { vao, vbo })
    }

    pub unsafe fn draw(&self, gl: &glow::Context) {
        gl.bind_vertex_array(Some(self.vao));
        gl.draw_arrays(glow::TRIANGLES, 0, 3);
        gl.bind_vertex_array(None);
    }

    pub unsafe fn destroy(&self, gl: &glow::Context) {
        gl.delete_vertex_array(self.vao);
        gl.delete_buffer(self.vbo);
    }
}
