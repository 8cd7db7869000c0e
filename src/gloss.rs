use crate::parser::{Construct, ConstructKind, UpdateOp};

/// Forms a captured name is glossed with: as written, then split into words
/// when that differs (`getUser` -> `get user`, `max_len` -> `max len`).
fn name_forms(name: &str) -> Vec<String> {
    let mut forms = vec![name.to_string()];
    let split = split_words(name);
    if split != name {
        forms.push(split);
    }
    forms
}

fn split_words(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for ch in name.chars() {
        if ch == '_' || ch == '$' || ch == '-' {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
            prev = None;
            continue;
        }
        if let Some(p) = prev {
            let boundary = (ch.is_uppercase() && (p.is_lowercase() || p.is_ascii_digit()))
                || (ch.is_ascii_digit() && p.is_alphabetic());
            if boundary {
                out.push(' ');
            }
        }
        out.extend(ch.to_lowercase());
        prev = Some(ch);
    }
    out.trim_end().to_string()
}

/// Every form of every captured name, falling back to `placeholder`
fn subjects(construct: &Construct, placeholder: &str) -> Vec<String> {
    if construct.names.is_empty() {
        return vec![placeholder.to_string()];
    }
    construct.names.iter().flat_map(|name| name_forms(name)).collect()
}

/// Forms of the captured names only, with no placeholder
fn named(construct: &Construct) -> Vec<String> {
    construct.names.iter().flat_map(|name| name_forms(name)).collect()
}

fn update_glosses(op: UpdateOp, names: &[String], out: &mut Vec<String>) {
    for n in names {
        match op {
            UpdateOp::Increment => out.extend([
                format!("increment {n}"),
                format!("{n}++"),
                format!("add one to {n}"),
                format!("increase {n}"),
                format!("increment {n} by one"),
                format!("increments {n}"),
            ]),
            UpdateOp::Decrement => out.extend([
                format!("decrement {n}"),
                format!("{n}--"),
                format!("subtract one from {n}"),
                format!("decrease {n}"),
                format!("decrement {n} by one"),
                format!("decrements {n}"),
            ]),
        }
    }
}

/// Canonical "obvious" phrasings of what `construct` does.
///
/// Deterministic: the same construct always yields the same list, in the
/// same order. Kinds with nothing obvious to say yield an empty list.
pub fn generate(construct: &Construct) -> Vec<String> {
    let mut out = Vec::new();
    let literal = construct.literal();

    match construct.kind {
        ConstructKind::Update { op } => update_glosses(op, &subjects(construct, "value"), &mut out),
        ConstructKind::Return => {
            out.extend(["return".to_string(), "return value".to_string()]);
            for n in named(construct) {
                out.extend([format!("return {n}"), format!("returns {n}")]);
            }
            if let Some(lit) = literal {
                out.extend([format!("return {lit}"), format!("returns {lit}")]);
            }
        }
        ConstructKind::Call => {
            for n in subjects(construct, "function") {
                out.extend([
                    format!("call {n}"),
                    n.clone(),
                    format!("invoke {n}"),
                    format!("calls {n}"),
                    format!("run {n}"),
                    format!("execute {n}"),
                    format!("call {n} function"),
                ]);
            }
        }
        ConstructKind::Declaration => {
            for n in subjects(construct, "variable") {
                out.extend([
                    format!("declare {n}"),
                    format!("create {n}"),
                    format!("define {n}"),
                    format!("initialize {n}"),
                    format!("declare variable {n}"),
                ]);
                if let Some(lit) = literal {
                    out.extend([
                        format!("{n} equals {lit}"),
                        format!("set {n} to {lit}"),
                        format!("{n} = {lit}"),
                    ]);
                }
            }
        }
        ConstructKind::Assignment => {
            for n in subjects(construct, "variable") {
                out.extend([
                    format!("set {n}"),
                    format!("assign {n}"),
                    format!("update {n}"),
                    format!("change {n}"),
                ]);
                if let Some(lit) = literal {
                    out.extend([
                        format!("{n} equals {lit}"),
                        format!("set {n} to {lit}"),
                        format!("assign {lit} to {n}"),
                    ]);
                }
            }
        }
        ConstructKind::Conditional => {
            out.extend(["if", "check if", "check", "if statement"].map(String::from));
            for n in named(construct) {
                out.extend([format!("if {n}"), format!("check if {n}"), format!("check {n}")]);
            }
        }
        ConstructKind::Loop => {
            out.extend(["loop", "iterate", "for loop", "while loop", "loop through"].map(String::from));
            for n in named(construct) {
                out.extend([
                    format!("loop over {n}"),
                    format!("iterate over {n}"),
                    format!("loop through {n}"),
                ]);
            }
        }
        ConstructKind::Switch => {
            out.extend(["switch", "switch statement"].map(String::from));
            for n in named(construct) {
                out.push(format!("switch on {n}"));
            }
        }
        ConstructKind::Try => out.extend(
            ["try catch", "try", "try block", "catch error", "handle error", "handle errors"].map(String::from),
        ),
        ConstructKind::Throw => {
            out.extend(["throw", "throw error", "throw exception"].map(String::from));
            for n in named(construct) {
                out.extend([format!("throw {n}"), format!("throw new {n}")]);
            }
        }
        ConstructKind::Break => {
            out.extend(["break", "break loop", "break out of loop", "exit loop"].map(String::from))
        }
        ConstructKind::Continue => {
            out.extend(["continue", "continue loop", "skip", "next iteration"].map(String::from))
        }
        ConstructKind::FunctionDef => {
            for n in named(construct) {
                out.extend([
                    format!("function {n}"),
                    format!("{n} function"),
                    format!("define {n}"),
                    format!("method {n}"),
                ]);
            }
            out.extend(["declare function", "define function", "function"].map(String::from));
        }
        ConstructKind::ClassDef => {
            for n in named(construct) {
                out.extend([format!("class {n}"), format!("{n} class"), format!("define {n}")]);
            }
            out.extend(["declare class", "define class", "class"].map(String::from));
        }
        ConstructKind::Empty | ConstructKind::Unknown => {}
    }

    out
}
