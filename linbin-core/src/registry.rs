//! Name-to-routine table for hosts that dispatch native calls by name.
//!
//! The table is fixed at compile time and turned into a lookup map on first
//! use. Lookups accept the registered name or its canonical symbol and never
//! fall back to searching for other symbols.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use linbin_common::{LinbinError, Result};
use serde::Serialize;
use tracing::debug;

use crate::routine::{self, linbin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallingConvention {
    C,
    Fortran,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    Doubles,
    DoublesMut,
    Int,
    Double,
}

/// One positional argument of a registered routine.
#[derive(Debug)]
pub enum RoutineArg<'a> {
    Doubles(&'a [f64]),
    DoublesMut(&'a mut [f64]),
    Int(i32),
    Double(f64),
}

impl RoutineArg<'_> {
    pub fn kind(&self) -> ArgKind {
        match self {
            RoutineArg::Doubles(_) => ArgKind::Doubles,
            RoutineArg::DoublesMut(_) => ArgKind::DoublesMut,
            RoutineArg::Int(_) => ArgKind::Int,
            RoutineArg::Double(_) => ArgKind::Double,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutineSpec {
    pub name: &'static str,
    pub symbol: String,
    pub convention: CallingConvention,
    pub params: &'static [ArgKind],
}

impl RoutineSpec {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

pub type RoutineEntry = fn(&mut [RoutineArg<'_>]) -> Result<()>;

struct RoutineDef {
    name: &'static str,
    convention: CallingConvention,
    params: &'static [ArgKind],
    entry: RoutineEntry,
}

const LINBIN_PARAMS: [ArgKind; 7] = [
    ArgKind::Doubles,    // x
    ArgKind::Int,        // n
    ArgKind::Double,     // a
    ArgKind::Double,     // b
    ArgKind::Int,        // m
    ArgKind::Int,        // trun
    ArgKind::DoublesMut, // gcounts
];

static ROUTINES: &[RoutineDef] = &[RoutineDef {
    name: routine::SYMBOL,
    convention: CallingConvention::Fortran,
    params: &LINBIN_PARAMS,
    entry: call_linbin,
}];

fn call_linbin(args: &mut [RoutineArg<'_>]) -> Result<()> {
    match args {
        [RoutineArg::Doubles(x), RoutineArg::Int(n), RoutineArg::Double(a), RoutineArg::Double(b), RoutineArg::Int(m), RoutineArg::Int(trun), RoutineArg::DoublesMut(gcounts)] => {
            linbin(x, *n, *a, *b, *m, *trun, gcounts)
        }
        _ => Err(LinbinError::Other("linbin called with unchecked arguments".into())),
    }
}

pub fn fortran_symbol(name: &str) -> String {
    let sanitized = sanitize_symbol(name).to_ascii_lowercase();
    if sanitized.ends_with('_') {
        sanitized
    } else {
        format!("{sanitized}_")
    }
}

fn canonical_symbol(name: &str, convention: CallingConvention) -> String {
    match convention {
        CallingConvention::C => sanitize_symbol(name),
        CallingConvention::Fortran => fortran_symbol(name),
    }
}

fn sanitize_symbol(name: &str) -> String {
    name.trim()
        .trim_end_matches('\0')
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect()
}

pub struct RoutineRegistry {
    routines: BTreeMap<String, (RoutineSpec, RoutineEntry)>,
}

impl RoutineRegistry {
    fn from_table(table: &[RoutineDef]) -> Self {
        let mut routines = BTreeMap::new();
        for def in table {
            let symbol = canonical_symbol(def.name, def.convention);
            debug!(name = def.name, symbol = %symbol, arity = def.params.len(), "registering routine");
            let spec = RoutineSpec {
                name: def.name,
                symbol: symbol.clone(),
                convention: def.convention,
                params: def.params,
            };
            routines.insert(symbol, (spec, def.entry));
        }
        Self { routines }
    }

    pub fn resolve(&self, name: &str) -> Option<&RoutineSpec> {
        self.lookup(name).map(|(spec, _)| spec)
    }

    pub fn specs(&self) -> impl Iterator<Item = &RoutineSpec> {
        self.routines.values().map(|(spec, _)| spec)
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    pub fn call(&self, name: &str, args: &mut [RoutineArg<'_>]) -> Result<()> {
        let (spec, entry) = self
            .lookup(name)
            .ok_or_else(|| LinbinError::RoutineNotRegistered(name.to_string()))?;
        if args.len() != spec.arity() {
            return Err(LinbinError::InvalidArgumentCount {
                symbol: spec.symbol.clone(),
                expected: spec.arity(),
                got: args.len(),
            });
        }
        for (position, (arg, want)) in args.iter().zip(spec.params).enumerate() {
            if arg.kind() != *want {
                return Err(LinbinError::InvalidArgument {
                    symbol: spec.symbol.clone(),
                    position,
                    message: format!("expected {want:?}, got {:?}", arg.kind()),
                });
            }
        }
        entry(args)
    }

    fn lookup(&self, name: &str) -> Option<&(RoutineSpec, RoutineEntry)> {
        if let Some(found) = self.routines.get(name) {
            return Some(found);
        }
        let c = canonical_symbol(name, CallingConvention::C);
        if let Some(found) = self.routines.get(&c) {
            return Some(found);
        }
        self.routines.get(&fortran_symbol(name))
    }
}

/// The process-wide table, built on first use.
pub fn registry() -> &'static RoutineRegistry {
    static REGISTRY: OnceLock<RoutineRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| RoutineRegistry::from_table(ROUTINES))
}
