//! Backing state for the stub backend.
//!
//! Objects are boxed and handed out as raw pointers, mirroring the real
//! library's ownership rules: terms, types and declarations belong to their
//! environment and are freed with it. Terms and types are interned, so
//! structurally equal values share one pointer and one id.

use std::collections::{HashMap, HashSet};
use std::ffi::CString;

pub(crate) struct ConfigData {
    pub options: HashMap<String, String>,
}

impl ConfigData {
    pub fn new() -> Self {
        Self {
            options: HashMap::new(),
        }
    }
}

pub(crate) enum TypeKind {
    Bool,
    Rational,
    Integer,
    Function {
        params: Vec<*mut TypeData>,
        ret: *mut TypeData,
    },
}

pub(crate) struct TypeData {
    pub kind: TypeKind,
}

pub(crate) struct DeclData {
    pub id: i32,
    pub name: String,
    pub ty: *mut TypeData,
}

pub(crate) enum TermKind {
    True,
    False,
    Not(*mut TermData),
    And(*mut TermData, *mut TermData),
    Or(*mut TermData, *mut TermData),
    Iff(*mut TermData, *mut TermData),
    Eq(*mut TermData, *mut TermData),
    Leq(*mut TermData, *mut TermData),
    Plus(*mut TermData, *mut TermData),
    Times(*mut TermData, *mut TermData),
    Floor(*mut TermData),
    Number(String),
    Ite(*mut TermData, *mut TermData, *mut TermData),
    Constant(*mut DeclData),
    Apply(*mut DeclData, Vec<*mut TermData>),
}

pub(crate) struct TermData {
    pub id: i32,
    pub kind: TermKind,
    pub ty: *mut TypeData,
}

impl TermData {
    /// Child terms in construction order.
    pub fn children(&self) -> Vec<*mut TermData> {
        match &self.kind {
            TermKind::Not(a) | TermKind::Floor(a) => vec![*a],
            TermKind::And(a, b)
            | TermKind::Or(a, b)
            | TermKind::Iff(a, b)
            | TermKind::Eq(a, b)
            | TermKind::Leq(a, b)
            | TermKind::Plus(a, b)
            | TermKind::Times(a, b) => vec![*a, *b],
            TermKind::Ite(a, b, c) => vec![*a, *b, *c],
            TermKind::Apply(_, args) => args.clone(),
            _ => Vec::new(),
        }
    }
}

#[derive(Hash, PartialEq, Eq)]
struct InternKey {
    tag: u8,
    children: Vec<usize>,
    text: Option<String>,
}

fn term_key(kind: &TermKind) -> InternKey {
    let (tag, children, text) = match kind {
        TermKind::True => (0, vec![], None),
        TermKind::False => (1, vec![], None),
        TermKind::Not(a) => (2, vec![*a as usize], None),
        TermKind::And(a, b) => (3, vec![*a as usize, *b as usize], None),
        TermKind::Or(a, b) => (4, vec![*a as usize, *b as usize], None),
        TermKind::Iff(a, b) => (5, vec![*a as usize, *b as usize], None),
        TermKind::Eq(a, b) => (6, vec![*a as usize, *b as usize], None),
        TermKind::Leq(a, b) => (7, vec![*a as usize, *b as usize], None),
        TermKind::Plus(a, b) => (8, vec![*a as usize, *b as usize], None),
        TermKind::Times(a, b) => (9, vec![*a as usize, *b as usize], None),
        TermKind::Floor(a) => (10, vec![*a as usize], None),
        TermKind::Number(s) => (11, vec![], Some(s.clone())),
        TermKind::Ite(a, b, c) => (12, vec![*a as usize, *b as usize, *c as usize], None),
        TermKind::Constant(d) => (13, vec![*d as usize], None),
        TermKind::Apply(d, args) => {
            let mut v = vec![*d as usize];
            v.extend(args.iter().map(|a| *a as usize));
            (14, v, None)
        }
    };
    InternKey {
        tag,
        children,
        text,
    }
}

fn type_key(kind: &TypeKind) -> InternKey {
    let (tag, children) = match kind {
        TypeKind::Bool => (0, vec![]),
        TypeKind::Rational => (1, vec![]),
        TypeKind::Integer => (2, vec![]),
        TypeKind::Function { params, ret } => {
            let mut v: Vec<usize> = params.iter().map(|p| *p as usize).collect();
            v.push(*ret as usize);
            (3, v)
        }
    };
    InternKey {
        tag,
        children,
        text: None,
    }
}

pub(crate) struct Assertion {
    pub term: *mut TermData,
    pub group: i32,
}

pub(crate) struct EnvData {
    terms: Vec<Box<TermData>>,
    types: Vec<Box<TypeData>>,
    decls: Vec<Box<DeclData>>,
    term_table: HashMap<InternKey, *mut TermData>,
    type_table: HashMap<InternKey, *mut TypeData>,
    pub decls_by_name: HashMap<String, *mut DeclData>,
    pub assertions: Vec<Assertion>,
    pub frames: Vec<usize>,
    pub next_group: i32,
    pub current_group: i32,
    pub last_error: Option<CString>,
    next_id: i32,
}

pub(crate) struct ModelData {
    pub env: *mut EnvData,
    pub assignment: HashMap<usize, bool>,
}

impl EnvData {
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
            types: Vec::new(),
            decls: Vec::new(),
            term_table: HashMap::new(),
            type_table: HashMap::new(),
            decls_by_name: HashMap::new(),
            assertions: Vec::new(),
            frames: Vec::new(),
            next_group: 0,
            current_group: -1,
            last_error: None,
            next_id: 0,
        }
    }

    pub fn set_error(&mut self, msg: &str) {
        self.last_error = CString::new(msg).ok();
    }

    fn fresh_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn intern_type(&mut self, kind: TypeKind) -> *mut TypeData {
        let key = type_key(&kind);
        if let Some(&p) = self.type_table.get(&key) {
            return p;
        }
        let mut boxed = Box::new(TypeData { kind });
        let p = &mut *boxed as *mut TypeData;
        self.types.push(boxed);
        self.type_table.insert(key, p);
        p
    }

    pub fn bool_type(&mut self) -> *mut TypeData {
        self.intern_type(TypeKind::Bool)
    }

    pub fn rational_type(&mut self) -> *mut TypeData {
        self.intern_type(TypeKind::Rational)
    }

    pub fn integer_type(&mut self) -> *mut TypeData {
        self.intern_type(TypeKind::Integer)
    }

    /// Type of a term under construction. Assumes children are well-typed;
    /// shape errors are caught before interning.
    fn type_of(&mut self, kind: &TermKind) -> *mut TypeData {
        unsafe {
            match kind {
                TermKind::True
                | TermKind::False
                | TermKind::Not(_)
                | TermKind::And(..)
                | TermKind::Or(..)
                | TermKind::Iff(..)
                | TermKind::Eq(..)
                | TermKind::Leq(..) => self.bool_type(),
                TermKind::Plus(a, b) | TermKind::Times(a, b) => {
                    let int = self.integer_type();
                    if (**a).ty == int && (**b).ty == int {
                        int
                    } else {
                        self.rational_type()
                    }
                }
                TermKind::Floor(_) => self.integer_type(),
                TermKind::Number(s) => {
                    if s.contains('/') {
                        self.rational_type()
                    } else {
                        self.integer_type()
                    }
                }
                TermKind::Ite(_, t, _) => (**t).ty,
                TermKind::Constant(d) => match &(*(**d).ty).kind {
                    TypeKind::Function { ret, .. } => *ret,
                    _ => (**d).ty,
                },
                TermKind::Apply(d, _) => match &(*(**d).ty).kind {
                    TypeKind::Function { ret, .. } => *ret,
                    _ => (**d).ty,
                },
            }
        }
    }

    pub fn intern_term(&mut self, kind: TermKind) -> *mut TermData {
        let key = term_key(&kind);
        if let Some(&p) = self.term_table.get(&key) {
            return p;
        }
        let ty = self.type_of(&kind);
        let id = self.fresh_id();
        let mut boxed = Box::new(TermData { id, kind, ty });
        let p = &mut *boxed as *mut TermData;
        self.terms.push(boxed);
        self.term_table.insert(key, p);
        p
    }

    pub fn declare(&mut self, name: &str, ty: *mut TypeData) -> Result<*mut DeclData, String> {
        if let Some(&d) = self.decls_by_name.get(name) {
            let existing = unsafe { (*d).ty };
            if existing == ty {
                return Ok(d);
            }
            return Err(format!("symbol `{}` already declared with another type", name));
        }
        let id = self.fresh_id();
        let mut boxed = Box::new(DeclData {
            id,
            name: name.to_string(),
            ty,
        });
        let p = &mut *boxed as *mut DeclData;
        self.decls.push(boxed);
        self.decls_by_name.insert(name.to_string(), p);
        Ok(p)
    }

    /// Literals currently forced by the assertion stack. Only the positive
    /// boolean skeleton is inspected: conjunctions are split, negations flip
    /// the sign, everything else is treated as an atom.
    pub fn forced_literals(&self) -> (HashSet<usize>, HashSet<usize>) {
        let mut pos = HashSet::new();
        let mut neg = HashSet::new();
        unsafe fn walk(
            t: *mut TermData,
            sign: bool,
            pos: &mut HashSet<usize>,
            neg: &mut HashSet<usize>,
        ) {
            match unsafe { &(*t).kind } {
                TermKind::And(a, b) if sign => unsafe {
                    walk(*a, true, pos, neg);
                    walk(*b, true, pos, neg);
                },
                TermKind::Or(a, b) if !sign => unsafe {
                    walk(*a, false, pos, neg);
                    walk(*b, false, pos, neg);
                },
                TermKind::Not(a) => unsafe { walk(*a, !sign, pos, neg) },
                _ => {
                    if sign {
                        pos.insert(t as usize);
                    } else {
                        neg.insert(t as usize);
                    }
                }
            }
        }
        for a in &self.assertions {
            unsafe { walk(a.term, true, &mut pos, &mut neg) };
        }
        (pos, neg)
    }

    /// Decide the current assertion stack. Complete only for the fragment the
    /// tests exercise: a conjunction of literals is UNSAT exactly when some
    /// literal occurs with both signs or a constant-false literal is forced.
    pub fn solve(&mut self) -> i32 {
        let (pos, neg) = self.forced_literals();
        for &p in &pos {
            let t = p as *mut TermData;
            if matches!(unsafe { &(*t).kind }, TermKind::False) {
                return crate::RESULT_UNSAT;
            }
            if neg.contains(&p) {
                return crate::RESULT_UNSAT;
            }
        }
        for &n in &neg {
            let t = n as *mut TermData;
            if matches!(unsafe { &(*t).kind }, TermKind::True) {
                return crate::RESULT_UNSAT;
            }
        }
        crate::RESULT_SAT
    }

    /// Truth assignment induced by the asserted literals.
    pub fn assignment(&self) -> HashMap<usize, bool> {
        let (pos, neg) = self.forced_literals();
        let mut map = HashMap::new();
        for p in pos {
            map.insert(p, true);
        }
        for n in neg {
            map.insert(n, false);
        }
        map
    }
}

/// Exact rational arithmetic over i128, wide enough for stub evaluation.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rat(pub i128, pub i128);

impl Rat {
    pub fn parse(s: &str) -> Option<Rat> {
        match s.split_once('/') {
            Some((n, d)) => {
                let d: i128 = d.parse().ok()?;
                if d == 0 {
                    return None;
                }
                Some(Rat(n.parse().ok()?, d).normalized())
            }
            None => Some(Rat(s.parse().ok()?, 1)),
        }
    }

    fn normalized(self) -> Rat {
        fn gcd(a: i128, b: i128) -> i128 {
            if b == 0 {
                a.abs()
            } else {
                gcd(b, a % b)
            }
        }
        let sign = if self.1 < 0 { -1 } else { 1 };
        let g = gcd(self.0, self.1).max(1);
        Rat(sign * self.0 / g, sign * self.1 / g)
    }

    pub fn add(self, other: Rat) -> Rat {
        Rat(self.0 * other.1 + other.0 * self.1, self.1 * other.1).normalized()
    }

    pub fn mul(self, other: Rat) -> Rat {
        Rat(self.0 * other.0, self.1 * other.1).normalized()
    }

    pub fn floor(self) -> Rat {
        Rat(self.0.div_euclid(self.1), 1)
    }

    pub fn leq(self, other: Rat) -> bool {
        self.0 * other.1 <= other.0 * self.1
    }

    pub fn render(self) -> String {
        if self.1 == 1 {
            format!("{}", self.0)
        } else {
            format!("{}/{}", self.0, self.1)
        }
    }
}

/// Outcome of stub evaluation; `Unknown` leaves the queried term unchanged.
pub(crate) enum EvalValue {
    Bool(bool),
    Num(Rat),
    Unknown,
}

pub(crate) unsafe fn eval(t: *mut TermData, assignment: &HashMap<usize, bool>) -> EvalValue {
    use EvalValue::*;
    if let Some(&b) = assignment.get(&(t as usize)) {
        return Bool(b);
    }
    let both =
        |a: *mut TermData, b: *mut TermData| (unsafe { eval(a, assignment) }, unsafe { eval(b, assignment) });
    match unsafe { &(*t).kind } {
        TermKind::True => Bool(true),
        TermKind::False => Bool(false),
        TermKind::Not(a) => match unsafe { eval(*a, assignment) } {
            Bool(b) => Bool(!b),
            _ => Unknown,
        },
        TermKind::And(a, b) => match both(*a, *b) {
            (Bool(x), Bool(y)) => Bool(x && y),
            _ => Unknown,
        },
        TermKind::Or(a, b) => match both(*a, *b) {
            (Bool(x), Bool(y)) => Bool(x || y),
            _ => Unknown,
        },
        TermKind::Iff(a, b) => match both(*a, *b) {
            (Bool(x), Bool(y)) => Bool(x == y),
            _ => Unknown,
        },
        TermKind::Eq(a, b) => match both(*a, *b) {
            (Num(x), Num(y)) => Bool(x == y),
            (Bool(x), Bool(y)) => Bool(x == y),
            _ => Unknown,
        },
        TermKind::Leq(a, b) => match both(*a, *b) {
            (Num(x), Num(y)) => Bool(x.leq(y)),
            _ => Unknown,
        },
        TermKind::Plus(a, b) => match both(*a, *b) {
            (Num(x), Num(y)) => Num(x.add(y)),
            _ => Unknown,
        },
        TermKind::Times(a, b) => match both(*a, *b) {
            (Num(x), Num(y)) => Num(x.mul(y)),
            _ => Unknown,
        },
        TermKind::Floor(a) => match unsafe { eval(*a, assignment) } {
            Num(x) => Num(x.floor()),
            _ => Unknown,
        },
        TermKind::Number(s) => match Rat::parse(s) {
            Some(r) => Num(r),
            None => Unknown,
        },
        TermKind::Ite(c, t, e) => match unsafe { eval(*c, assignment) } {
            Bool(true) => unsafe { eval(*t, assignment) },
            Bool(false) => unsafe { eval(*e, assignment) },
            _ => Unknown,
        },
        TermKind::Constant(_) | TermKind::Apply(..) => Unknown,
    }
}

/// Rebuild `src` recursively inside `dst`, re-declaring symbols by name.
pub(crate) unsafe fn copy_type(dst: &mut EnvData, ty: *mut TypeData) -> *mut TypeData {
    match unsafe { &(*ty).kind } {
        TypeKind::Bool => dst.bool_type(),
        TypeKind::Rational => dst.rational_type(),
        TypeKind::Integer => dst.integer_type(),
        TypeKind::Function { params, ret } => {
            let params: Vec<_> = params
                .iter()
                .map(|p| unsafe { copy_type(dst, *p) })
                .collect();
            let ret = unsafe { copy_type(dst, *ret) };
            dst.intern_type(TypeKind::Function { params, ret })
        }
    }
}

pub(crate) unsafe fn copy_term(
    dst: &mut EnvData,
    src: *mut TermData,
) -> Result<*mut TermData, String> {
    let copy_decl = |dst: &mut EnvData, d: *mut DeclData| -> Result<*mut DeclData, String> {
        let ty = unsafe { copy_type(dst, (*d).ty) };
        let name = unsafe { (*d).name.clone() };
        dst.declare(&name, ty)
    };
    let kind = match unsafe { &(*src).kind } {
        TermKind::True => TermKind::True,
        TermKind::False => TermKind::False,
        TermKind::Not(a) => TermKind::Not(unsafe { copy_term(dst, *a)? }),
        TermKind::And(a, b) => {
            TermKind::And(unsafe { copy_term(dst, *a)? }, unsafe { copy_term(dst, *b)? })
        }
        TermKind::Or(a, b) => {
            TermKind::Or(unsafe { copy_term(dst, *a)? }, unsafe { copy_term(dst, *b)? })
        }
        TermKind::Iff(a, b) => {
            TermKind::Iff(unsafe { copy_term(dst, *a)? }, unsafe { copy_term(dst, *b)? })
        }
        TermKind::Eq(a, b) => {
            TermKind::Eq(unsafe { copy_term(dst, *a)? }, unsafe { copy_term(dst, *b)? })
        }
        TermKind::Leq(a, b) => {
            TermKind::Leq(unsafe { copy_term(dst, *a)? }, unsafe { copy_term(dst, *b)? })
        }
        TermKind::Plus(a, b) => {
            TermKind::Plus(unsafe { copy_term(dst, *a)? }, unsafe { copy_term(dst, *b)? })
        }
        TermKind::Times(a, b) => {
            TermKind::Times(unsafe { copy_term(dst, *a)? }, unsafe { copy_term(dst, *b)? })
        }
        TermKind::Floor(a) => TermKind::Floor(unsafe { copy_term(dst, *a)? }),
        TermKind::Number(s) => TermKind::Number(s.clone()),
        TermKind::Ite(a, b, c) => TermKind::Ite(
            unsafe { copy_term(dst, *a)? },
            unsafe { copy_term(dst, *b)? },
            unsafe { copy_term(dst, *c)? },
        ),
        TermKind::Constant(d) => TermKind::Constant(copy_decl(dst, *d)?),
        TermKind::Apply(d, args) => {
            let d = copy_decl(dst, *d)?;
            let mut copied = Vec::with_capacity(args.len());
            for a in args {
                copied.push(unsafe { copy_term(dst, *a)? });
            }
            TermKind::Apply(d, copied)
        }
    };
    Ok(dst.intern_term(kind))
}
