//! Per-operation signature table for the `libbasalt` ABI.
//!
//! One entry per exported operation: symbol name, ordered parameter kinds,
//! return kind. Operations taking a (buffer, length) collection use
//! `seq_op!` with the element kind in brackets at the splice point.
//!
//! This table is the single source of truth the call layer trusts; a wrong
//! entry here is the only way to desynchronize from the native ABI.

use crate::ffi::caller::{SeqSignature, Signature};
use crate::ffi::types::Kind;

macro_rules! op {
    ($ident:ident = $sym:literal ($($p:ident),*) -> $ret:ident) => {
        pub(crate) static $ident: Signature = Signature {
            name: $sym,
            params: &[$(Kind::$p),*],
            ret: Kind::$ret,
        };
    };
}

macro_rules! seq_op {
    ($ident:ident = $sym:literal ($($pre:ident),* ; [$elem:ident] $(, $suf:ident)*) -> $ret:ident) => {
        pub(crate) static $ident: SeqSignature = SeqSignature {
            name: $sym,
            prefix: &[$(Kind::$pre),*],
            elem: Kind::$elem,
            suffix: &[$(Kind::$suf),*],
            ret: Kind::$ret,
        };
    };
}

// Configuration
op!(CONFIG_NEW = "basalt_config_new" () -> Config);
op!(CONFIG_PARSE = "basalt_config_parse" (Str) -> Config);
op!(CONFIG_FREE = "basalt_config_free" (Config) -> Void);
op!(CONFIG_SET_OPTION = "basalt_config_set_option" (Config, Str, Str) -> Status);

// Environments
op!(ENV_NEW = "basalt_env_new" (Config) -> Env);
op!(ENV_NEW_SHARED = "basalt_env_new_shared" (Config, Env) -> Env);
op!(ENV_FREE = "basalt_env_free" (Env) -> Void);
op!(ENV_RESET = "basalt_env_reset" (Env) -> Status);
seq_op!(ENV_GC = "basalt_env_gc" (Env; [Term]) -> Status);

// Types
op!(BOOL_TYPE = "basalt_bool_type" (Env) -> Type);
op!(RATIONAL_TYPE = "basalt_rational_type" (Env) -> Type);
op!(INTEGER_TYPE = "basalt_integer_type" (Env) -> Type);
seq_op!(FUNCTION_TYPE = "basalt_function_type" (Env; [Type], Type) -> Type);
op!(IS_BOOL_TYPE = "basalt_is_bool_type" (Env, Type) -> Bool);
op!(IS_RATIONAL_TYPE = "basalt_is_rational_type" (Env, Type) -> Bool);
op!(IS_INTEGER_TYPE = "basalt_is_integer_type" (Env, Type) -> Bool);
op!(IS_FUNCTION_TYPE = "basalt_is_function_type" (Env, Type) -> Bool);

// Declarations
op!(DECLARE = "basalt_declare" (Env, Str, Type) -> Decl);
op!(FIND_DECL = "basalt_find_decl" (Env, Str) -> Decl);
op!(DECL_ID = "basalt_decl_id" (Decl) -> Int);

// Term construction
op!(MAKE_TRUE = "basalt_make_true" (Env) -> Term);
op!(MAKE_FALSE = "basalt_make_false" (Env) -> Term);
op!(MAKE_NOT = "basalt_make_not" (Env, Term) -> Term);
op!(MAKE_AND = "basalt_make_and" (Env, Term, Term) -> Term);
op!(MAKE_OR = "basalt_make_or" (Env, Term, Term) -> Term);
op!(MAKE_IFF = "basalt_make_iff" (Env, Term, Term) -> Term);
op!(MAKE_EQUAL = "basalt_make_equal" (Env, Term, Term) -> Term);
op!(MAKE_LEQ = "basalt_make_leq" (Env, Term, Term) -> Term);
op!(MAKE_PLUS = "basalt_make_plus" (Env, Term, Term) -> Term);
op!(MAKE_TIMES = "basalt_make_times" (Env, Term, Term) -> Term);
op!(MAKE_FLOOR = "basalt_make_floor" (Env, Term) -> Term);
op!(MAKE_NUMBER = "basalt_make_number" (Env, Str) -> Term);
op!(MAKE_ITE = "basalt_make_ite" (Env, Term, Term, Term) -> Term);
op!(MAKE_CONSTANT = "basalt_make_constant" (Env, Decl) -> Term);
seq_op!(MAKE_APPLY = "basalt_make_apply" (Env, Decl; [Term]) -> Term);
op!(TERM_COPY = "basalt_term_copy" (Env, Term, Env) -> Term);

// Term introspection
op!(TERM_ID = "basalt_term_id" (Term) -> Int);
op!(TERM_ARITY = "basalt_term_arity" (Term) -> Int);
op!(TERM_ARG = "basalt_term_arg" (Term, Int) -> Term);
op!(TERM_TYPE = "basalt_term_type" (Term) -> Type);
op!(TERM_DECL = "basalt_term_decl" (Term) -> Decl);
op!(TERM_TO_NUMBER = "basalt_term_to_number" (Env, Term) -> Str);
op!(TERM_IS_TRUE = "basalt_term_is_true" (Env, Term) -> Bool);
op!(TERM_IS_FALSE = "basalt_term_is_false" (Env, Term) -> Bool);
op!(TERM_IS_BOOL_CONSTANT = "basalt_term_is_bool_constant" (Env, Term) -> Bool);
op!(TERM_IS_ATOM = "basalt_term_is_atom" (Env, Term) -> Bool);
op!(TERM_IS_NUMBER = "basalt_term_is_number" (Env, Term) -> Bool);
op!(TERM_IS_AND = "basalt_term_is_and" (Env, Term) -> Bool);
op!(TERM_IS_OR = "basalt_term_is_or" (Env, Term) -> Bool);
op!(TERM_IS_NOT = "basalt_term_is_not" (Env, Term) -> Bool);
op!(TERM_IS_IFF = "basalt_term_is_iff" (Env, Term) -> Bool);
op!(TERM_IS_EQUAL = "basalt_term_is_equal" (Env, Term) -> Bool);
op!(TERM_IS_LEQ = "basalt_term_is_leq" (Env, Term) -> Bool);
op!(TERM_IS_PLUS = "basalt_term_is_plus" (Env, Term) -> Bool);
op!(TERM_IS_TIMES = "basalt_term_is_times" (Env, Term) -> Bool);
op!(TERM_IS_FLOOR = "basalt_term_is_floor" (Env, Term) -> Bool);
op!(TERM_IS_ITE = "basalt_term_is_ite" (Env, Term) -> Bool);
op!(TERM_IS_CONSTANT = "basalt_term_is_constant" (Env, Term) -> Bool);
op!(TERM_IS_APPLY = "basalt_term_is_apply" (Env, Term) -> Bool);

// Parsing and printing
op!(PARSE_SMTLIB2 = "basalt_parse_smtlib2" (Env, Str) -> Term);
op!(PARSE_TERM = "basalt_parse_term" (Env, Str) -> Term);
op!(PRINT_SMTLIB2 = "basalt_print_smtlib2" (Env, Term) -> Str);

// Solving
op!(PUSH = "basalt_push" (Env) -> Status);
op!(POP = "basalt_pop" (Env) -> Status);
op!(NUM_BACKTRACK_POINTS = "basalt_num_backtrack_points" (Env) -> Int);
op!(ASSERT = "basalt_assert" (Env, Term) -> Status);
op!(SOLVE = "basalt_solve" (Env) -> Sat);

// Interpolation
op!(ITP_GROUP_NEW = "basalt_itp_group_new" (Env) -> Int);
op!(ITP_GROUP_SET = "basalt_itp_group_set" (Env, Int) -> Status);
seq_op!(INTERPOLANT = "basalt_interpolant" (Env; [Int]) -> Term);

// Models
op!(MODEL_GET = "basalt_model_get" (Env) -> Model);
op!(MODEL_FREE = "basalt_model_free" (Model) -> Void);
op!(MODEL_EVAL = "basalt_model_eval" (Model, Term) -> Term);
op!(MODEL_VALUE = "basalt_model_value" (Env, Term) -> Term);

// Diagnostics
op!(LAST_ERROR = "basalt_last_error" (Env) -> Str);

/// Symbol releasing native-owned text; resolved once and threaded into every
/// bound operation that returns text.
pub(crate) const STR_FREE: &str = "basalt_str_free";
