use crate::scanner::{Token, TokenKind};

/// Reports a compile-time (syntax) error at a given token, in
/// panic-mode: once `panic_mode` is set the caller should stop calling
/// this function until `synchronize` clears it again, so that one bad
/// token doesn't cascade into a wall of follow-on errors.
pub fn report_compile_error(token: &Token, message: &str) {
    eprint!("\x1b[31;1m[line {}] Error\x1b[0m", token.line);

    match token.kind {
        TokenKind::EOF => eprint!(" at end"),
        TokenKind::ERROR => {}
        _ => eprint!(" at '{}'", token.lexeme),
    }

    eprintln!(": {}", message);
}

/// One entry of the runtime stack trace: the name of the function that
/// was executing (or `None` for the top-level script) and the source
/// line the frame's instruction pointer had reached.
pub struct FrameInfo<'a> {
    pub name: Option<&'a str>,
    pub line: i32,
}

/// Reports an uncaught runtime error and a frame-by-frame stack trace,
/// innermost frame first.
pub fn report_runtime_error(message: &str, frames: &[FrameInfo]) {
    eprintln!("\x1b[31;1mRuntimeError:\x1b[0m {}", message);
    eprintln!("Traceback (most recent call last):");

    for frame in frames {
        match frame.name {
            Some(name) => eprintln!("    [line {}] in {}()", frame.line, name),
            None => eprintln!("    [line {}] in <script>", frame.line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_info_formats_script_frame_without_panicking() {
        let frames = [FrameInfo { name: None, line: 3 }, FrameInfo { name: Some("fib"), line: 7 }];
        report_runtime_error("stack overflow", &frames);
    }
}
