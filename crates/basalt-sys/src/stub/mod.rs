//! In-process reference backend.
//!
//! A small, honest implementation of the `libbasalt` C ABI, compiled into the
//! process instead of loaded from a shared object. The `basalt` crate binds
//! it through the same signature-driven call path it uses for the real
//! library, so every marshaling rule is exercised end to end without the
//! solver installed.
//!
//! Coverage is deliberately partial on the solving side: the decision
//! procedure handles conjunctions of literals (enough for incremental
//! push/pop scenarios), models assign the forced literals, and interpolants
//! are the conjunction of the requested groups. Shared environments are
//! independent here; term transfer still goes through `basalt_term_copy`,
//! exactly as with the real library.
//!
//! Every string returned to the caller is a fresh allocation that must be
//! released with `basalt_str_free`; [`outstanding_text_buffers`] exposes the
//! live count so tests can assert the copy-then-release discipline.

mod sexp;
mod state;

use std::ffi::{c_char, c_void, CStr, CString};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::{RawConfig, RawDecl, RawEnv, RawModel, RawTerm, RawType, STATUS_OK};
use state::{ConfigData, DeclData, EnvData, EvalValue, ModelData, TermData, TermKind, TypeData, TypeKind};

const STATUS_ERROR: i32 = -1;

static TEXT_LIVE: AtomicI64 = AtomicI64::new(0);

/// Number of native-owned text buffers not yet released with
/// `basalt_str_free`. Zero after a well-behaved caller finishes.
pub fn outstanding_text_buffers() -> i64 {
    TEXT_LIVE.load(Ordering::SeqCst)
}

fn give_text(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(c) => {
            TEXT_LIVE.fetch_add(1, Ordering::SeqCst);
            c.into_raw()
        }
        Err(_) => std::ptr::null_mut(),
    }
}

unsafe fn take_str<'a>(p: *const c_char) -> Option<&'a str> {
    if p.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(p) }.to_str().ok()
}

unsafe fn env_mut<'a>(e: RawEnv) -> &'a mut EnvData {
    unsafe { &mut *(e.0 as *mut EnvData) }
}

unsafe fn cfg_mut<'a>(c: RawConfig) -> &'a mut ConfigData {
    unsafe { &mut *(c.0 as *mut ConfigData) }
}

fn term(p: *mut TermData) -> RawTerm {
    RawTerm(p as *mut c_void)
}

fn term_ptr(t: RawTerm) -> *mut TermData {
    t.0 as *mut TermData
}

fn ty_ptr(t: RawType) -> *mut TypeData {
    t.0 as *mut TypeData
}

fn decl_ptr(d: RawDecl) -> *mut DeclData {
    d.0 as *mut DeclData
}

// ── Configuration ───────────────────────────────────────────────────

pub extern "C" fn basalt_config_new() -> RawConfig {
    RawConfig(Box::into_raw(Box::new(ConfigData::new())) as *mut c_void)
}

pub extern "C" fn basalt_config_parse(text: *const c_char) -> RawConfig {
    let Some(text) = (unsafe { take_str(text) }) else {
        return RawConfig::error();
    };
    let mut cfg = ConfigData::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return RawConfig::error();
        };
        cfg.options
            .insert(key.trim().to_string(), value.trim().to_string());
    }
    RawConfig(Box::into_raw(Box::new(cfg)) as *mut c_void)
}

pub extern "C" fn basalt_config_free(cfg: RawConfig) {
    if !cfg.is_error() {
        drop(unsafe { Box::from_raw(cfg.0 as *mut ConfigData) });
    }
}

pub extern "C" fn basalt_config_set_option(
    cfg: RawConfig,
    key: *const c_char,
    value: *const c_char,
) -> i32 {
    if cfg.is_error() {
        return STATUS_ERROR;
    }
    let (Some(key), Some(value)) = (unsafe { take_str(key) }, unsafe { take_str(value) }) else {
        return STATUS_ERROR;
    };
    if key.is_empty() {
        return STATUS_ERROR;
    }
    unsafe { cfg_mut(cfg) }
        .options
        .insert(key.to_string(), value.to_string());
    STATUS_OK
}

// ── Environments ────────────────────────────────────────────────────

pub extern "C" fn basalt_env_new(cfg: RawConfig) -> RawEnv {
    if cfg.is_error() {
        return RawEnv::error();
    }
    RawEnv(Box::into_raw(Box::new(EnvData::new())) as *mut c_void)
}

pub extern "C" fn basalt_env_new_shared(cfg: RawConfig, sibling: RawEnv) -> RawEnv {
    if sibling.is_error() {
        return RawEnv::error();
    }
    basalt_env_new(cfg)
}

pub extern "C" fn basalt_env_free(env: RawEnv) {
    if !env.is_error() {
        drop(unsafe { Box::from_raw(env.0 as *mut EnvData) });
    }
}

pub extern "C" fn basalt_env_reset(env: RawEnv) -> i32 {
    if env.is_error() {
        return STATUS_ERROR;
    }
    let env = unsafe { env_mut(env) };
    env.assertions.clear();
    env.frames.clear();
    STATUS_OK
}

pub extern "C" fn basalt_env_gc(env: RawEnv, keep: *const RawTerm, n: usize) -> i32 {
    if env.is_error() || (n > 0 && keep.is_null()) {
        return STATUS_ERROR;
    }
    // Advisory in the stub: nothing is collected, the keep-set is only
    // validated for shape.
    STATUS_OK
}

// ── Types ───────────────────────────────────────────────────────────

pub extern "C" fn basalt_bool_type(env: RawEnv) -> RawType {
    if env.is_error() {
        return RawType::error();
    }
    RawType(unsafe { env_mut(env) }.bool_type() as *mut c_void)
}

pub extern "C" fn basalt_rational_type(env: RawEnv) -> RawType {
    if env.is_error() {
        return RawType::error();
    }
    RawType(unsafe { env_mut(env) }.rational_type() as *mut c_void)
}

pub extern "C" fn basalt_integer_type(env: RawEnv) -> RawType {
    if env.is_error() {
        return RawType::error();
    }
    RawType(unsafe { env_mut(env) }.integer_type() as *mut c_void)
}

pub extern "C" fn basalt_function_type(
    env: RawEnv,
    params: *const RawType,
    n: usize,
    ret: RawType,
) -> RawType {
    if env.is_error() || ret.is_error() || (n > 0 && params.is_null()) {
        return RawType::error();
    }
    let params: Vec<*mut TypeData> = if n == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(params, n) }
            .iter()
            .map(|t| ty_ptr(*t))
            .collect()
    };
    let e = unsafe { env_mut(env) };
    RawType(e.intern_type(TypeKind::Function {
        params,
        ret: ty_ptr(ret),
    }) as *mut c_void)
}

fn type_is(env: RawEnv, ty: RawType, pred: fn(&TypeKind) -> bool) -> i32 {
    if env.is_error() || ty.is_error() {
        return 0;
    }
    pred(unsafe { &(*ty_ptr(ty)).kind }) as i32
}

pub extern "C" fn basalt_is_bool_type(env: RawEnv, ty: RawType) -> i32 {
    type_is(env, ty, |k| matches!(k, TypeKind::Bool))
}

pub extern "C" fn basalt_is_rational_type(env: RawEnv, ty: RawType) -> i32 {
    type_is(env, ty, |k| matches!(k, TypeKind::Rational))
}

pub extern "C" fn basalt_is_integer_type(env: RawEnv, ty: RawType) -> i32 {
    type_is(env, ty, |k| matches!(k, TypeKind::Integer))
}

pub extern "C" fn basalt_is_function_type(env: RawEnv, ty: RawType) -> i32 {
    type_is(env, ty, |k| matches!(k, TypeKind::Function { .. }))
}

// ── Declarations ────────────────────────────────────────────────────

pub extern "C" fn basalt_declare(env: RawEnv, name: *const c_char, ty: RawType) -> RawDecl {
    if env.is_error() || ty.is_error() {
        return RawDecl::error();
    }
    let Some(name) = (unsafe { take_str(name) }) else {
        return RawDecl::error();
    };
    let e = unsafe { env_mut(env) };
    match e.declare(name, ty_ptr(ty)) {
        Ok(d) => RawDecl(d as *mut c_void),
        Err(msg) => {
            e.set_error(&msg);
            RawDecl::error()
        }
    }
}

pub extern "C" fn basalt_find_decl(env: RawEnv, name: *const c_char) -> RawDecl {
    if env.is_error() {
        return RawDecl::error();
    }
    let Some(name) = (unsafe { take_str(name) }) else {
        return RawDecl::error();
    };
    match unsafe { env_mut(env) }.decls_by_name.get(name) {
        Some(&d) => RawDecl(d as *mut c_void),
        None => RawDecl::error(),
    }
}

pub extern "C" fn basalt_decl_id(decl: RawDecl) -> i32 {
    if decl.is_error() {
        return -1;
    }
    unsafe { (*decl_ptr(decl)).id }
}

// ── Term construction ───────────────────────────────────────────────

fn make_nullary(env: RawEnv, kind: TermKind) -> RawTerm {
    if env.is_error() {
        return RawTerm::error();
    }
    term(unsafe { env_mut(env) }.intern_term(kind))
}

pub extern "C" fn basalt_make_true(env: RawEnv) -> RawTerm {
    make_nullary(env, TermKind::True)
}

pub extern "C" fn basalt_make_false(env: RawEnv) -> RawTerm {
    make_nullary(env, TermKind::False)
}

fn make_unary(env: RawEnv, a: RawTerm, build: fn(*mut TermData) -> TermKind) -> RawTerm {
    if env.is_error() || a.is_error() {
        return RawTerm::error();
    }
    term(unsafe { env_mut(env) }.intern_term(build(term_ptr(a))))
}

fn make_binary(
    env: RawEnv,
    a: RawTerm,
    b: RawTerm,
    build: fn(*mut TermData, *mut TermData) -> TermKind,
) -> RawTerm {
    if env.is_error() || a.is_error() || b.is_error() {
        return RawTerm::error();
    }
    term(unsafe { env_mut(env) }.intern_term(build(term_ptr(a), term_ptr(b))))
}

pub extern "C" fn basalt_make_not(env: RawEnv, a: RawTerm) -> RawTerm {
    make_unary(env, a, TermKind::Not)
}

pub extern "C" fn basalt_make_floor(env: RawEnv, a: RawTerm) -> RawTerm {
    make_unary(env, a, TermKind::Floor)
}

pub extern "C" fn basalt_make_and(env: RawEnv, a: RawTerm, b: RawTerm) -> RawTerm {
    make_binary(env, a, b, TermKind::And)
}

pub extern "C" fn basalt_make_or(env: RawEnv, a: RawTerm, b: RawTerm) -> RawTerm {
    make_binary(env, a, b, TermKind::Or)
}

pub extern "C" fn basalt_make_iff(env: RawEnv, a: RawTerm, b: RawTerm) -> RawTerm {
    make_binary(env, a, b, TermKind::Iff)
}

pub extern "C" fn basalt_make_equal(env: RawEnv, a: RawTerm, b: RawTerm) -> RawTerm {
    make_binary(env, a, b, TermKind::Eq)
}

pub extern "C" fn basalt_make_leq(env: RawEnv, a: RawTerm, b: RawTerm) -> RawTerm {
    make_binary(env, a, b, TermKind::Leq)
}

pub extern "C" fn basalt_make_plus(env: RawEnv, a: RawTerm, b: RawTerm) -> RawTerm {
    make_binary(env, a, b, TermKind::Plus)
}

pub extern "C" fn basalt_make_times(env: RawEnv, a: RawTerm, b: RawTerm) -> RawTerm {
    make_binary(env, a, b, TermKind::Times)
}

pub extern "C" fn basalt_make_number(env: RawEnv, text: *const c_char) -> RawTerm {
    if env.is_error() {
        return RawTerm::error();
    }
    let e = unsafe { env_mut(env) };
    let Some(text) = (unsafe { take_str(text) }) else {
        return RawTerm::error();
    };
    if !sexp::is_numeral(text) {
        e.set_error(&format!("`{}` is not a numeral", text));
        return RawTerm::error();
    }
    term(e.intern_term(TermKind::Number(text.to_string())))
}

pub extern "C" fn basalt_make_ite(env: RawEnv, c: RawTerm, t: RawTerm, e: RawTerm) -> RawTerm {
    if env.is_error() || c.is_error() || t.is_error() || e.is_error() {
        return RawTerm::error();
    }
    term(unsafe { env_mut(env) }.intern_term(TermKind::Ite(
        term_ptr(c),
        term_ptr(t),
        term_ptr(e),
    )))
}

pub extern "C" fn basalt_make_constant(env: RawEnv, decl: RawDecl) -> RawTerm {
    if env.is_error() || decl.is_error() {
        return RawTerm::error();
    }
    let e = unsafe { env_mut(env) };
    let d = decl_ptr(decl);
    if let TypeKind::Function { params, .. } = unsafe { &(*(*d).ty).kind } {
        if !params.is_empty() {
            e.set_error("constant reference to a symbol with parameters");
            return RawTerm::error();
        }
    }
    term(e.intern_term(TermKind::Constant(d)))
}

pub extern "C" fn basalt_make_apply(
    env: RawEnv,
    decl: RawDecl,
    args: *const RawTerm,
    n: usize,
) -> RawTerm {
    if env.is_error() || decl.is_error() || (n > 0 && args.is_null()) {
        return RawTerm::error();
    }
    let e = unsafe { env_mut(env) };
    let d = decl_ptr(decl);
    let args: Vec<*mut TermData> = if n == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(args, n) }
            .iter()
            .map(|a| term_ptr(*a))
            .collect()
    };
    match unsafe { &(*(*d).ty).kind } {
        TypeKind::Function { params, .. } if params.len() == n => {
            for (arg, want) in args.iter().zip(params) {
                if unsafe { (**arg).ty } != *want {
                    e.set_error("argument type mismatch in application");
                    return RawTerm::error();
                }
            }
        }
        _ => {
            e.set_error("application arity mismatch");
            return RawTerm::error();
        }
    }
    term(e.intern_term(TermKind::Apply(d, args)))
}

pub extern "C" fn basalt_term_copy(env: RawEnv, t: RawTerm, src: RawEnv) -> RawTerm {
    if env.is_error() || t.is_error() || src.is_error() {
        return RawTerm::error();
    }
    let e = unsafe { env_mut(env) };
    match unsafe { state::copy_term(e, term_ptr(t)) } {
        Ok(p) => term(p),
        Err(msg) => {
            e.set_error(&msg);
            RawTerm::error()
        }
    }
}

// ── Term introspection ──────────────────────────────────────────────

pub extern "C" fn basalt_term_id(t: RawTerm) -> i32 {
    if t.is_error() {
        return -1;
    }
    unsafe { (*term_ptr(t)).id }
}

pub extern "C" fn basalt_term_arity(t: RawTerm) -> i32 {
    if t.is_error() {
        return -1;
    }
    unsafe { &*term_ptr(t) }.children().len() as i32
}

pub extern "C" fn basalt_term_arg(t: RawTerm, i: i32) -> RawTerm {
    if t.is_error() || i < 0 {
        return RawTerm::error();
    }
    match unsafe { &*term_ptr(t) }.children().get(i as usize) {
        Some(&c) => term(c),
        None => RawTerm::error(),
    }
}

pub extern "C" fn basalt_term_type(t: RawTerm) -> RawType {
    if t.is_error() {
        return RawType::error();
    }
    RawType(unsafe { (*term_ptr(t)).ty } as *mut c_void)
}

pub extern "C" fn basalt_term_decl(t: RawTerm) -> RawDecl {
    if t.is_error() {
        return RawDecl::error();
    }
    match unsafe { &(*term_ptr(t)).kind } {
        TermKind::Constant(d) | TermKind::Apply(d, _) => RawDecl(*d as *mut c_void),
        _ => RawDecl::error(),
    }
}

pub extern "C" fn basalt_term_to_number(env: RawEnv, t: RawTerm) -> *mut c_char {
    if env.is_error() || t.is_error() {
        return std::ptr::null_mut();
    }
    match unsafe { &(*term_ptr(t)).kind } {
        TermKind::Number(s) => give_text(s),
        _ => {
            unsafe { env_mut(env) }.set_error("term is not a numeric literal");
            std::ptr::null_mut()
        }
    }
}

fn term_is(env: RawEnv, t: RawTerm, pred: fn(&TermData) -> bool) -> i32 {
    if env.is_error() || t.is_error() {
        return 0;
    }
    pred(unsafe { &*term_ptr(t) }) as i32
}

pub extern "C" fn basalt_term_is_true(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::True))
}

pub extern "C" fn basalt_term_is_false(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::False))
}

pub extern "C" fn basalt_term_is_bool_constant(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| {
        matches!(t.kind, TermKind::Constant(_))
            && matches!(unsafe { &(*t.ty).kind }, TypeKind::Bool)
    })
}

pub extern "C" fn basalt_term_is_atom(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| {
        matches!(
            t.kind,
            TermKind::Constant(_) | TermKind::Apply(..) | TermKind::Eq(..) | TermKind::Leq(..)
        ) && matches!(unsafe { &(*t.ty).kind }, TypeKind::Bool)
    })
}

pub extern "C" fn basalt_term_is_number(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::Number(_)))
}

pub extern "C" fn basalt_term_is_and(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::And(..)))
}

pub extern "C" fn basalt_term_is_or(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::Or(..)))
}

pub extern "C" fn basalt_term_is_not(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::Not(_)))
}

pub extern "C" fn basalt_term_is_iff(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::Iff(..)))
}

pub extern "C" fn basalt_term_is_equal(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::Eq(..)))
}

pub extern "C" fn basalt_term_is_leq(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::Leq(..)))
}

pub extern "C" fn basalt_term_is_plus(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::Plus(..)))
}

pub extern "C" fn basalt_term_is_times(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::Times(..)))
}

pub extern "C" fn basalt_term_is_floor(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::Floor(_)))
}

pub extern "C" fn basalt_term_is_ite(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::Ite(..)))
}

pub extern "C" fn basalt_term_is_constant(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::Constant(_)))
}

pub extern "C" fn basalt_term_is_apply(env: RawEnv, t: RawTerm) -> i32 {
    term_is(env, t, |t| matches!(t.kind, TermKind::Apply(..)))
}

// ── Parsing and printing ────────────────────────────────────────────

fn parse_into(env: RawEnv, text: *const c_char) -> RawTerm {
    if env.is_error() {
        return RawTerm::error();
    }
    let e = unsafe { env_mut(env) };
    let Some(text) = (unsafe { take_str(text) }) else {
        return RawTerm::error();
    };
    match sexp::parse_term(e, text) {
        Ok(p) => term(p),
        Err(msg) => {
            e.set_error(&msg);
            RawTerm::error()
        }
    }
}

pub extern "C" fn basalt_parse_smtlib2(env: RawEnv, text: *const c_char) -> RawTerm {
    parse_into(env, text)
}

pub extern "C" fn basalt_parse_term(env: RawEnv, text: *const c_char) -> RawTerm {
    parse_into(env, text)
}

pub extern "C" fn basalt_print_smtlib2(env: RawEnv, t: RawTerm) -> *mut c_char {
    if env.is_error() || t.is_error() {
        return std::ptr::null_mut();
    }
    give_text(&sexp::print_term(term_ptr(t)))
}

// ── Solving ─────────────────────────────────────────────────────────

pub extern "C" fn basalt_push(env: RawEnv) -> i32 {
    if env.is_error() {
        return STATUS_ERROR;
    }
    let e = unsafe { env_mut(env) };
    let mark = e.assertions.len();
    e.frames.push(mark);
    STATUS_OK
}

pub extern "C" fn basalt_pop(env: RawEnv) -> i32 {
    if env.is_error() {
        return STATUS_ERROR;
    }
    let e = unsafe { env_mut(env) };
    match e.frames.pop() {
        Some(mark) => {
            e.assertions.truncate(mark);
            STATUS_OK
        }
        None => {
            e.set_error("no open backtrack point");
            STATUS_ERROR
        }
    }
}

pub extern "C" fn basalt_num_backtrack_points(env: RawEnv) -> i32 {
    if env.is_error() {
        return -1;
    }
    unsafe { env_mut(env) }.frames.len() as i32
}

pub extern "C" fn basalt_assert(env: RawEnv, t: RawTerm) -> i32 {
    if env.is_error() || t.is_error() {
        return STATUS_ERROR;
    }
    let e = unsafe { env_mut(env) };
    let bool_ty = e.bool_type();
    if unsafe { (*term_ptr(t)).ty } != bool_ty {
        e.set_error("asserted term is not boolean");
        return STATUS_ERROR;
    }
    let group = e.current_group;
    e.assertions.push(state::Assertion {
        term: term_ptr(t),
        group,
    });
    STATUS_OK
}

pub extern "C" fn basalt_solve(env: RawEnv) -> i32 {
    if env.is_error() {
        return crate::RESULT_UNKNOWN;
    }
    unsafe { env_mut(env) }.solve()
}

// ── Interpolation ───────────────────────────────────────────────────

pub extern "C" fn basalt_itp_group_new(env: RawEnv) -> i32 {
    if env.is_error() {
        return -1;
    }
    let e = unsafe { env_mut(env) };
    let g = e.next_group;
    e.next_group += 1;
    g
}

pub extern "C" fn basalt_itp_group_set(env: RawEnv, group: i32) -> i32 {
    if env.is_error() {
        return STATUS_ERROR;
    }
    let e = unsafe { env_mut(env) };
    if group < 0 || group >= e.next_group {
        e.set_error("unknown interpolation group");
        return STATUS_ERROR;
    }
    e.current_group = group;
    STATUS_OK
}

pub extern "C" fn basalt_interpolant(env: RawEnv, groups: *const i32, n: usize) -> RawTerm {
    if env.is_error() || (n > 0 && groups.is_null()) {
        return RawTerm::error();
    }
    let e = unsafe { env_mut(env) };
    let wanted: Vec<i32> = if n == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(groups, n) }.to_vec()
    };
    let members: Vec<*mut TermData> = e
        .assertions
        .iter()
        .filter(|a| wanted.contains(&a.group))
        .map(|a| a.term)
        .collect();
    let mut acc = e.intern_term(TermKind::True);
    for m in members {
        acc = e.intern_term(TermKind::And(acc, m));
    }
    term(acc)
}

// ── Models ──────────────────────────────────────────────────────────

pub extern "C" fn basalt_model_get(env: RawEnv) -> RawModel {
    if env.is_error() {
        return RawModel::error();
    }
    let e = unsafe { env_mut(env) };
    let model = ModelData {
        env: e as *mut EnvData,
        assignment: e.assignment(),
    };
    RawModel(Box::into_raw(Box::new(model)) as *mut c_void)
}

pub extern "C" fn basalt_model_free(m: RawModel) {
    if !m.is_error() {
        drop(unsafe { Box::from_raw(m.0 as *mut ModelData) });
    }
}

fn value_to_term(e: &mut EnvData, queried: *mut TermData, v: EvalValue) -> RawTerm {
    match v {
        EvalValue::Bool(true) => term(e.intern_term(TermKind::True)),
        EvalValue::Bool(false) => term(e.intern_term(TermKind::False)),
        EvalValue::Num(r) => term(e.intern_term(TermKind::Number(r.render()))),
        EvalValue::Unknown => term(queried),
    }
}

pub extern "C" fn basalt_model_eval(m: RawModel, t: RawTerm) -> RawTerm {
    if m.is_error() || t.is_error() {
        return RawTerm::error();
    }
    let model = unsafe { &*(m.0 as *mut ModelData) };
    let e = unsafe { &mut *model.env };
    let v = unsafe { state::eval(term_ptr(t), &model.assignment) };
    value_to_term(e, term_ptr(t), v)
}

pub extern "C" fn basalt_model_value(env: RawEnv, t: RawTerm) -> RawTerm {
    if env.is_error() || t.is_error() {
        return RawTerm::error();
    }
    let e = unsafe { env_mut(env) };
    let assignment = e.assignment();
    let v = unsafe { state::eval(term_ptr(t), &assignment) };
    value_to_term(e, term_ptr(t), v)
}

// ── Diagnostics ─────────────────────────────────────────────────────

pub extern "C" fn basalt_last_error(env: RawEnv) -> *mut c_char {
    if env.is_error() {
        return std::ptr::null_mut();
    }
    match &unsafe { env_mut(env) }.last_error {
        Some(msg) => give_text(&msg.to_string_lossy()),
        None => std::ptr::null_mut(),
    }
}

pub extern "C" fn basalt_str_free(s: *mut c_char) {
    if !s.is_null() {
        TEXT_LIVE.fetch_sub(1, Ordering::SeqCst);
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Resolve a `libbasalt` symbol name to the stub implementation.
pub fn lookup(name: &str) -> Option<*const c_void> {
    macro_rules! table {
        ($($sym:ident),* $(,)?) => {
            match name {
                $(stringify!($sym) => Some($sym as *const c_void),)*
                _ => None,
            }
        };
    }
    table!(
        basalt_config_new,
        basalt_config_parse,
        basalt_config_free,
        basalt_config_set_option,
        basalt_env_new,
        basalt_env_new_shared,
        basalt_env_free,
        basalt_env_reset,
        basalt_env_gc,
        basalt_bool_type,
        basalt_rational_type,
        basalt_integer_type,
        basalt_function_type,
        basalt_is_bool_type,
        basalt_is_rational_type,
        basalt_is_integer_type,
        basalt_is_function_type,
        basalt_declare,
        basalt_find_decl,
        basalt_decl_id,
        basalt_make_true,
        basalt_make_false,
        basalt_make_not,
        basalt_make_floor,
        basalt_make_and,
        basalt_make_or,
        basalt_make_iff,
        basalt_make_equal,
        basalt_make_leq,
        basalt_make_plus,
        basalt_make_times,
        basalt_make_number,
        basalt_make_ite,
        basalt_make_constant,
        basalt_make_apply,
        basalt_term_copy,
        basalt_term_id,
        basalt_term_arity,
        basalt_term_arg,
        basalt_term_type,
        basalt_term_decl,
        basalt_term_to_number,
        basalt_term_is_true,
        basalt_term_is_false,
        basalt_term_is_bool_constant,
        basalt_term_is_atom,
        basalt_term_is_number,
        basalt_term_is_and,
        basalt_term_is_or,
        basalt_term_is_not,
        basalt_term_is_iff,
        basalt_term_is_equal,
        basalt_term_is_leq,
        basalt_term_is_plus,
        basalt_term_is_times,
        basalt_term_is_floor,
        basalt_term_is_ite,
        basalt_term_is_constant,
        basalt_term_is_apply,
        basalt_parse_smtlib2,
        basalt_parse_term,
        basalt_print_smtlib2,
        basalt_push,
        basalt_pop,
        basalt_num_backtrack_points,
        basalt_assert,
        basalt_solve,
        basalt_itp_group_new,
        basalt_itp_group_set,
        basalt_interpolant,
        basalt_model_get,
        basalt_model_free,
        basalt_model_eval,
        basalt_model_value,
        basalt_last_error,
        basalt_str_free,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_env() -> RawEnv {
        let cfg = basalt_config_new();
        let env = basalt_env_new(cfg);
        basalt_config_free(cfg);
        env
    }

    #[test]
    fn test_lookup_resolves_every_op() {
        assert!(lookup("basalt_solve").is_some());
        assert!(lookup("basalt_make_and").is_some());
        assert!(lookup("basalt_no_such_symbol").is_none());
    }

    #[test]
    fn test_terms_are_interned() {
        let env = fresh_env();
        let a = basalt_make_true(env);
        let b = basalt_make_true(env);
        assert_eq!(a, b);
        let n1 = basalt_make_not(env, a);
        let n2 = basalt_make_not(env, b);
        assert_eq!(n1, n2);
        assert_ne!(basalt_term_id(n1), basalt_term_id(a));
        basalt_env_free(env);
    }

    #[test]
    fn test_contradiction_detected() {
        let env = fresh_env();
        let ty = basalt_bool_type(env);
        let name = CString::new("p").unwrap();
        let d = basalt_declare(env, name.as_ptr(), ty);
        let p = basalt_make_constant(env, d);
        let np = basalt_make_not(env, p);
        assert_eq!(basalt_assert(env, p), STATUS_OK);
        assert_eq!(basalt_assert(env, np), STATUS_OK);
        assert_eq!(basalt_solve(env), crate::RESULT_UNSAT);
        basalt_env_free(env);
    }

    #[test]
    fn test_text_buffers_balance() {
        let env = fresh_env();
        let t = basalt_make_true(env);
        let before = outstanding_text_buffers();
        let s = basalt_print_smtlib2(env, t);
        assert!(!s.is_null());
        assert_eq!(outstanding_text_buffers(), before + 1);
        basalt_str_free(s);
        assert_eq!(outstanding_text_buffers(), before);
        basalt_env_free(env);
    }
}
