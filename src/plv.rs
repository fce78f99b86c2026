//! Optional JSON export of a compiled `Chunk`, in the spirit of a
//! Program Lifecycle Visualizer that dumps compiler-internal state for
//! an external viewer. This crate has no AST to export — the compiler
//! emits bytecode directly — so the closest equivalent is a structured
//! dump of the bytecode itself: one JSON object per instruction plus
//! the constant pool, recursively into nested function chunks. Gated
//! behind the `plv` feature so `serde_json` stays an optional
//! dependency.

use serde_json::{json, Value as Json};

use crate::chunk::{Chunk, OpCode};
use crate::heap::Heap;
use crate::value::Value;

/// Renders `chunk` (and, recursively, every function chunk reachable
/// through its constant pool) as a JSON report: an envelope with a
/// nested section per compilation stage. This crate only has one stage
/// worth reporting (bytecode), so the envelope carries just that
/// section.
pub fn export_chunk(chunk: &Chunk, heap: &Heap, name: &str) -> Json {
    json!({
        "run_type": if cfg!(debug_assertions) { "DEV" } else { "RELEASE" },
        "bytecode": chunk_to_json(chunk, heap, name),
    })
}

fn chunk_to_json(chunk: &Chunk, heap: &Heap, name: &str) -> Json {
    let instructions = disassemble_to_json(chunk, heap);
    let constants: Vec<Json> = chunk.constants.iter().map(|c| constant_to_json(c, heap)).collect();

    let functions: Vec<Json> = chunk
        .constants
        .iter()
        .filter_map(|c| match c {
            Value::Obj(handle) => heap.as_function(*handle).map(|f| {
                let fname = match f.name {
                    Some(n) => heap.as_string(n).unwrap().chars.clone(),
                    None => "<script>".to_string(),
                };
                chunk_to_json(&f.chunk, heap, &fname)
            }),
            _ => None,
        })
        .collect();

    json!({
        "name": name,
        "instructions": instructions,
        "constants": constants,
        "functions": functions,
    })
}

fn disassemble_to_json(chunk: &Chunk, heap: &Heap) -> Vec<Json> {
    let mut out = Vec::new();
    let mut offset = 0;
    while offset < chunk.code.len() {
        let byte = chunk.code[offset];
        let op = OpCode::from_u8(byte);
        let mnemonic = match op {
            Some(op) => format!("{:?}", op),
            None => format!("UNKNOWN({:#04x})", byte),
        };

        let operand_width = operand_width(op);
        out.push(json!({
            "offset": offset,
            "line": chunk.lines[offset],
            "op": mnemonic,
        }));
        offset += 1 + operand_width;
    }
    out
}

fn operand_width(op: Option<OpCode>) -> usize {
    use OpCode::*;
    match op {
        Some(OP_CONSTANT | OP_GET_LOCAL | OP_SET_LOCAL | OP_GET_GLOBAL | OP_DEFINE_GLOBAL | OP_SET_GLOBAL
            | OP_CALL) => 1,
        Some(OP_JUMP | OP_JUMP_IF_FALSE | OP_LOOP) => 2,
        _ => 0,
    }
}

fn constant_to_json(value: &Value, heap: &Heap) -> Json {
    match value {
        Value::Nil => Json::Null,
        Value::Bool(b) => json!(b),
        Value::Number(n) => json!(n),
        Value::Obj(handle) => {
            if let Some(s) = heap.as_string(*handle) {
                json!(s.chars)
            } else if let Some(f) = heap.as_function(*handle) {
                match f.name {
                    Some(n) => json!(format!("<fn {}>", heap.as_string(n).unwrap().chars)),
                    None => json!("<script>"),
                }
            } else {
                Json::Null
            }
        }
    }
}

/// Writes `export_chunk`'s report to `path`, for the CLI's `--plv` flag.
pub fn write_report(chunk: &Chunk, heap: &Heap, name: &str, path: &str) -> std::io::Result<()> {
    let report = export_chunk(chunk, heap, name);
    let text = serde_json::to_string_pretty(&report).expect("a bytecode JSON report always serializes");
    std::fs::write(path, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    #[test]
    fn exports_a_trivial_chunk_without_panicking() {
        let mut engine = Engine::new();
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::OP_NIL, 1);
        chunk.write_op(OpCode::OP_RETURN, 1);
        let report = export_chunk(&chunk, &engine.heap, "<script>");
        assert_eq!(report["bytecode"]["name"], "<script>");
        assert_eq!(report["bytecode"]["instructions"].as_array().unwrap().len(), 2);

        // touch the heap so a string constant round-trips through
        // `constant_to_json` too.
        let handle = engine.intern("x");
        chunk.add_constant(Value::Obj(handle)).unwrap();
        let report = export_chunk(&chunk, &engine.heap, "<script>");
        assert_eq!(report["bytecode"]["constants"][0], "x");
    }
}
