//! Whole-program integration tests: each case feeds a full program
//! through `bramble::run_source_capturing` and asserts on stdout plus
//! the returned `InterpretResult`. These cover a handful of named
//! behaviors plus the boundary cases around them directly.

use bramble::InterpretResult;

fn run(source: &str) -> (InterpretResult, String) {
    bramble::run_source_capturing(source)
}

#[test]
fn scenario_1_arithmetic_precedence() {
    let (result, out) = run("print 1 + 2 * 3;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "7\n");
}

#[test]
fn scenario_2_string_interning_equality() {
    let (result, out) = run("var a = \"foo\"; var b = \"foo\"; print a == b;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "true\n");
}

#[test]
fn scenario_3_recursive_fibonacci() {
    let source = "fun fib(n) { if (n < 2) return n; return fib(n-1) + fib(n-2); } print fib(10);";
    let (result, out) = run(source);
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "55\n");
}

#[test]
fn scenario_4_for_loop_prints_each_iteration_on_its_own_line() {
    let (result, out) = run("for (var i = 0; i < 3; i = i + 1) print i;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "0\n1\n2\n");
}

#[test]
fn scenario_5_uninitialized_variable_is_nil() {
    let (result, out) = run("var x; print x;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "nil\n");
}

#[test]
fn scenario_6_adding_string_and_number_is_a_runtime_error() {
    let (result, out) = run("\"a\" + 1;");
    assert_eq!(result, InterpretResult::RuntimeError);
    assert_eq!(out, "");
}

#[test]
fn block_scoping_shadows_then_restores_the_outer_binding() {
    let (result, out) = run("var x=1; { var x=2; print x; } print x;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "2\n1\n");
}

#[test]
fn and_or_short_circuit_leaving_the_deciding_operand() {
    let (result, out) = run("print false and 1; print 2 or 3;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "false\n2\n");
}

#[test]
fn global_reassignment_does_not_implicitly_declare() {
    let (result, _) = run("x = 1;");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn undefined_global_read_is_a_runtime_error() {
    let (result, _) = run("print nonexistent;");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn while_loop_accumulates_across_iterations() {
    let (result, out) = run("var i = 0; var sum = 0; while (i < 5) { sum = sum + i; i = i + 1; } print sum;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "10\n");
}

#[test]
fn functions_close_over_nothing_but_still_recurse_by_name() {
    let source = "fun countdown(n) { if (n <= 0) { print 0; return; } print n; countdown(n - 1); } countdown(2);";
    let (result, out) = run(source);
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "2\n1\n0\n");
}

#[test]
fn calling_a_non_function_value_is_a_runtime_error() {
    let (result, _) = run("var x = 1; x();");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn wrong_arity_call_is_a_runtime_error() {
    let (result, _) = run("fun f(a, b) { return a + b; } f(1);");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn boundary_too_many_constants_in_one_chunk_is_a_compile_error() {
    let mut source = String::new();
    for i in 0..257 {
        source.push_str(&format!("print {};", i));
    }
    let (result, _) = run(&source);
    assert_eq!(result, InterpretResult::CompileError);
}

#[test]
fn boundary_too_many_locals_in_one_function_is_a_compile_error() {
    let mut source = String::from("{");
    for i in 0..257 {
        source.push_str(&format!("var v{} = {};", i, i));
    }
    source.push('}');
    let (result, _) = run(&source);
    assert_eq!(result, InterpretResult::CompileError);
}

#[test]
fn boundary_deep_recursion_is_a_runtime_stack_overflow() {
    let source = "fun recurse(n) { return recurse(n + 1); } recurse(0);";
    let (result, _) = run(source);
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn syntax_error_recovers_and_still_reports_a_second_error() {
    // Two independent malformed statements; a single `CompileError`
    // covers both without the first cascading into spurious follow-on
    // errors for the second.
    let (result, _) = run("var; var;");
    assert_eq!(result, InterpretResult::CompileError);
}
