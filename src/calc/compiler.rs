// Copyright 2025 Cubecalc Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Expression compiler
//!
//! Turns a typed [`Expr`] into a [`Calc`]. Calls are compiled by their
//! [`FunDef`](crate::functions::FunDef), which compiles its own arguments
//! back through this compiler, so the tree is built bottom-up.
//!
//! The compiler carries an ambient list of preferred [`ResultStyle`]s.
//! Set-producing function definitions read it to decide whether to hand out
//! a shared list, a fresh mutable list or a lazy iterable.
//! [`compile_as`](ExprCompiler::compile_as) swaps the list for the duration
//! of one sub-compilation.
//!
//! The per-shape entry points (`compile_boolean`, `compile_double`, ...)
//! compile generically and then wrap the result in the narrowest adapter
//! the shape requires:
//!
//! | required | produced | adapter |
//! |---|---|---|
//! | boolean | double, integer | `value != 0` |
//! | double | integer | widening |
//! | integer | double | truncation |
//! | list | iterable | drain into a fresh list per evaluation |
//! | mutable list | shared list | copy-on-write clone |
//! | iterable | list | the list itself |
//! | scalar | member, tuple, hierarchy, dimension | value extraction |
//!
//! Asking for a shape the expression's type cannot supply is a programming
//! error and fails with [`Error::ShapeMismatch`].

use std::sync::Arc;

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::CompilerConfig;
use crate::core::{ElementType, Error, Result, ScalarKind, Type, Value};
use crate::expr::{Expr, Parameter};
use crate::functions::{
    DimensionCurrentMemberCalc, FunctionTable, HierarchyCurrentMemberCalc, HierarchyDimensionCalc,
    LevelDimensionCalc, LevelHierarchyCalc, MemberDimensionCalc, MemberHierarchyCalc,
    MemberLevelCalc,
};

use super::{
    BooleanCalc, Calc, ConstantCalc, CopyListCalc, DateTimeCalc, DimensionCalc, DoubleCalc,
    DoubleToIntegerCalc, DrainIterCalc, GenericAccessor, GenericCalc, HierarchyCalc, IntegerCalc,
    IntegerToDoubleCalc, IterCalc, LevelCalc, ListCalc, ListIterCalc, MemberCalc,
    MemberValueCalc, NumericBooleanCalc, ParameterCalc, ParameterSlot, ResultStyle, Shape,
    StringCalc, TupleCalc, TupleValueCalc,
};

/// Compiles expressions into calcs
///
/// One compiler is used per query; it owns the query's parameter slots.
pub struct ExprCompiler<'a> {
    functions: &'a FunctionTable,
    config: CompilerConfig,
    result_styles: Vec<ResultStyle>,
    parameters: FxHashMap<Arc<str>, Arc<ParameterSlot>>,
    /// Next slot index; never reused, even when a registration fails
    next_slot: usize,
    /// Parameters whose default expression is being compiled
    compiling_defaults: FxHashSet<Arc<str>>,
}

impl<'a> ExprCompiler<'a> {
    pub fn new(functions: &'a FunctionTable) -> Self {
        Self::with_config(functions, CompilerConfig::default())
    }

    pub fn with_config(functions: &'a FunctionTable, config: CompilerConfig) -> Self {
        Self {
            functions,
            result_styles: config.result_styles.clone(),
            config,
            parameters: FxHashMap::default(),
            next_slot: 0,
            compiling_defaults: FxHashSet::default(),
        }
    }

    pub fn functions(&self) -> &'a FunctionTable {
        self.functions
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Ambient preferred result styles, most preferred first
    pub fn result_styles(&self) -> &[ResultStyle] {
        &self.result_styles
    }

    /// First ambient style among those a producer can supply
    pub fn choose_style(&self, available: &[ResultStyle]) -> Option<ResultStyle> {
        let chosen = ResultStyle::choose(&self.result_styles, available);
        trace!(
            "result style: preferred {:?}, available {:?}, chose {:?}",
            self.result_styles,
            available,
            chosen
        );
        chosen
    }

    // =========================================================================
    // Generic compilation
    // =========================================================================

    /// Compiles `expr` in its native shape, under the ambient result styles
    pub fn compile(&mut self, expr: &Expr) -> Result<Calc> {
        match expr {
            Expr::Literal { value, ty } => {
                Ok(ConstantCalc::new(value.clone(), ty.clone()).into_calc())
            }
            Expr::Member(m) => Ok(ConstantCalc::new(Value::Member(m.clone()), expr.ty()).into_calc()),
            Expr::Level(l) => Ok(ConstantCalc::new(Value::Level(l.clone()), expr.ty()).into_calc()),
            Expr::Hierarchy(h) => {
                Ok(ConstantCalc::new(Value::Hierarchy(h.clone()), expr.ty()).into_calc())
            }
            Expr::Dimension(d) => {
                Ok(ConstantCalc::new(Value::Dimension(d.clone()), expr.ty()).into_calc())
            }
            Expr::Parameter(parameter) => self.compile_parameter(parameter),
            Expr::Call(call) => {
                let def = self.functions.lookup(&call.name)?;
                def.info().validate_arg_count(call.args.len())?;
                let calc = def.compile_call(call, self)?;
                trace!("compiled {} to {}", call, calc);
                Ok(calc)
            }
        }
    }

    /// Compiles `expr` under `styles`, first coercing it to `target`
    ///
    /// The ambient styles are restored afterwards, also when compilation
    /// fails. Structural coercions applied when `target` differs from the
    /// expression's type:
    ///
    /// - dimension to member, via the current member of its hierarchy
    /// - hierarchy to member, via its current member
    /// - level, member or dimension to hierarchy
    /// - member, level or hierarchy to dimension
    /// - member to level
    pub fn compile_as(
        &mut self,
        expr: &Expr,
        target: Option<&Type>,
        styles: &[ResultStyle],
    ) -> Result<Calc> {
        let saved = std::mem::replace(&mut self.result_styles, styles.to_vec());
        let result = match target {
            Some(target) => self.compile_coerced(expr, target),
            None => self.compile(expr),
        };
        self.result_styles = saved;
        result
    }

    fn compile_coerced(&mut self, expr: &Expr, target: &Type) -> Result<Calc> {
        let ty = expr.ty();
        let calc = match (&ty, target) {
            (Type::Dimension(_), Type::Member(_)) => {
                let dimension = self.compile_dimension(expr)?;
                Calc::Member(Arc::new(DimensionCurrentMemberCalc::new(dimension)))
            }
            (Type::Hierarchy(_), Type::Member(_)) => {
                let hierarchy = self.compile_hierarchy(expr)?;
                Calc::Member(Arc::new(HierarchyCurrentMemberCalc::new(hierarchy)))
            }
            (Type::Level(_), Type::Hierarchy(_)) => {
                let level = self.compile_level(expr)?;
                Calc::Hierarchy(Arc::new(LevelHierarchyCalc::new(level)))
            }
            (Type::Member(_), Type::Hierarchy(_)) | (Type::Dimension(_), Type::Hierarchy(_)) => {
                let member = self.compile_member(expr)?;
                Calc::Hierarchy(Arc::new(MemberHierarchyCalc::new(member)))
            }
            (Type::Member(_), Type::Dimension(_)) => {
                let member = self.compile_member(expr)?;
                Calc::Dimension(Arc::new(MemberDimensionCalc::new(member)))
            }
            (Type::Level(_), Type::Dimension(_)) => {
                let level = self.compile_level(expr)?;
                Calc::Dimension(Arc::new(LevelDimensionCalc::new(level)))
            }
            (Type::Hierarchy(_), Type::Dimension(_)) => {
                let hierarchy = self.compile_hierarchy(expr)?;
                Calc::Dimension(Arc::new(HierarchyDimensionCalc::new(hierarchy)))
            }
            (Type::Member(_), Type::Level(_)) => {
                let member = self.compile_member(expr)?;
                Calc::Level(Arc::new(MemberLevelCalc::new(member)))
            }
            _ => return self.compile(expr),
        };
        debug!(
            "coerced {} from {} to {} with {}",
            expr,
            ty.family(),
            target.family(),
            calc.name()
        );
        Ok(calc)
    }

    // =========================================================================
    // Scalar shapes
    // =========================================================================

    pub fn compile_boolean(&mut self, expr: &Expr) -> Result<Arc<dyn BooleanCalc>> {
        match self.compile_scalar(expr, false)? {
            Calc::Boolean(calc) => Ok(calc),
            Calc::Double(calc) => {
                debug!("boolean over double for {}", expr);
                Ok(Arc::new(NumericBooleanCalc::from_double(calc)))
            }
            Calc::Integer(calc) => {
                debug!("boolean over integer for {}", expr);
                Ok(Arc::new(NumericBooleanCalc::from_integer(calc)))
            }
            Calc::Generic(calc) if is_numeric(&calc) => {
                debug!("boolean over numeric value for {}", expr);
                Ok(Arc::new(NumericBooleanCalc::from_double(accessor(calc))))
            }
            Calc::Generic(calc) if accepts_scalar(&calc, |k| k == ScalarKind::Boolean) => {
                Ok(accessor(calc))
            }
            other => Err(other.shape_mismatch(Shape::Boolean)),
        }
    }

    pub fn compile_double(&mut self, expr: &Expr) -> Result<Arc<dyn DoubleCalc>> {
        match self.compile_scalar(expr, false)? {
            Calc::Double(calc) => Ok(calc),
            Calc::Integer(calc) => {
                debug!("double over integer for {}", expr);
                Ok(Arc::new(IntegerToDoubleCalc::new(calc)))
            }
            Calc::Generic(calc) if accepts_scalar(&calc, |k| k.is_numeric()) => Ok(accessor(calc)),
            other => Err(other.shape_mismatch(Shape::Double)),
        }
    }

    pub fn compile_integer(&mut self, expr: &Expr) -> Result<Arc<dyn IntegerCalc>> {
        match self.compile_scalar(expr, false)? {
            Calc::Integer(calc) => Ok(calc),
            Calc::Double(calc) => {
                debug!("integer over double for {}", expr);
                Ok(Arc::new(DoubleToIntegerCalc::new(calc)))
            }
            Calc::Generic(calc) if accepts_scalar(&calc, |k| k.is_numeric()) => Ok(accessor(calc)),
            other => Err(other.shape_mismatch(Shape::Integer)),
        }
    }

    pub fn compile_string(&mut self, expr: &Expr) -> Result<Arc<dyn StringCalc>> {
        match self.compile_scalar(expr, false)? {
            Calc::String(calc) => Ok(calc),
            Calc::Generic(calc) if accepts_scalar(&calc, |k| k == ScalarKind::String) => {
                Ok(accessor(calc))
            }
            other => Err(other.shape_mismatch(Shape::String)),
        }
    }

    pub fn compile_datetime(&mut self, expr: &Expr) -> Result<Arc<dyn DateTimeCalc>> {
        match self.compile_scalar(expr, false)? {
            Calc::DateTime(calc) => Ok(calc),
            Calc::Generic(calc) if accepts_scalar(&calc, |k| k == ScalarKind::DateTime) => {
                Ok(accessor(calc))
            }
            other => Err(other.shape_mismatch(Shape::DateTime)),
        }
    }

    /// Compiles `expr` to a scalar-valued calc
    ///
    /// Member, tuple, hierarchy and dimension expressions yield the value of
    /// the cell they address. With `specific`, scalar expressions are
    /// compiled to the shape of their scalar kind instead of their native
    /// shape.
    pub fn compile_scalar(&mut self, expr: &Expr, specific: bool) -> Result<Calc> {
        let ty = expr.ty();
        match &ty {
            Type::Member(_) | Type::Hierarchy(_) | Type::Dimension(_) => {
                let member = self.compile_member(expr)?;
                debug!("value extraction over member {}", expr);
                Ok(MemberValueCalc::create(
                    vec![member],
                    self.config.unrelated_dimension_null_check,
                ))
            }
            Type::Tuple(_) => self.compile_tuple_value(expr),
            Type::Scalar(kind) if specific => match kind {
                ScalarKind::Boolean => Ok(Calc::Boolean(self.compile_boolean(expr)?)),
                ScalarKind::String => Ok(Calc::String(self.compile_string(expr)?)),
                ScalarKind::DateTime => Ok(Calc::DateTime(self.compile_datetime(expr)?)),
                kind if kind.is_integer() => Ok(Calc::Integer(self.compile_integer(expr)?)),
                kind if kind.is_numeric() => Ok(Calc::Double(self.compile_double(expr)?)),
                _ => self.compile(expr),
            },
            _ => self.compile(expr),
        }
    }

    fn compile_tuple_value(&mut self, expr: &Expr) -> Result<Calc> {
        let null_check = self.config.unrelated_dimension_null_check;
        if self.config.collapse_tuple_value {
            if let Some(call) = expr.as_call().filter(|call| call.is_member_tuple()) {
                let members = call
                    .args
                    .iter()
                    .map(|arg| self.compile_member(arg))
                    .collect::<Result<Vec<_>>>()?;
                debug!("value extraction over {} members of {}", members.len(), expr);
                return Ok(MemberValueCalc::create(members, null_check));
            }
        }
        let tuple = self.compile_tuple(expr)?;
        debug!("value extraction over tuple {}", expr);
        Ok(Calc::Generic(Arc::new(TupleValueCalc::new(tuple, null_check))))
    }

    // =========================================================================
    // Structural shapes
    // =========================================================================

    pub fn compile_member(&mut self, expr: &Expr) -> Result<Arc<dyn MemberCalc>> {
        match self.compile_coerced(expr, &Type::member())? {
            Calc::Member(calc) => Ok(calc),
            Calc::Generic(calc) if matches!(calc.ty(), Type::Member(_)) => Ok(accessor(calc)),
            other => Err(other.shape_mismatch(Shape::Member)),
        }
    }

    pub fn compile_tuple(&mut self, expr: &Expr) -> Result<Arc<dyn TupleCalc>> {
        match self.compile(expr)? {
            Calc::Tuple(calc) => Ok(calc),
            Calc::Generic(calc) if matches!(calc.ty(), Type::Tuple(_)) => Ok(accessor(calc)),
            other => Err(other.shape_mismatch(Shape::Tuple)),
        }
    }

    pub fn compile_level(&mut self, expr: &Expr) -> Result<Arc<dyn LevelCalc>> {
        match self.compile_coerced(expr, &Type::Level(ElementType::unknown()))? {
            Calc::Level(calc) => Ok(calc),
            Calc::Generic(calc) if matches!(calc.ty(), Type::Level(_)) => Ok(accessor(calc)),
            other => Err(other.shape_mismatch(Shape::Level)),
        }
    }

    pub fn compile_hierarchy(&mut self, expr: &Expr) -> Result<Arc<dyn HierarchyCalc>> {
        match self.compile_coerced(expr, &Type::hierarchy())? {
            Calc::Hierarchy(calc) => Ok(calc),
            Calc::Generic(calc) if matches!(calc.ty(), Type::Hierarchy(_)) => Ok(accessor(calc)),
            other => Err(other.shape_mismatch(Shape::Hierarchy)),
        }
    }

    pub fn compile_dimension(&mut self, expr: &Expr) -> Result<Arc<dyn DimensionCalc>> {
        match self.compile_coerced(expr, &Type::Dimension(None))? {
            Calc::Dimension(calc) => Ok(calc),
            Calc::Generic(calc) if matches!(calc.ty(), Type::Dimension(_)) => Ok(accessor(calc)),
            other => Err(other.shape_mismatch(Shape::Dimension)),
        }
    }

    // =========================================================================
    // Set shapes
    // =========================================================================

    /// Compiles a set expression to a list
    ///
    /// With `mutable`, every evaluation returns a list the caller owns.
    pub fn compile_list(&mut self, expr: &Expr, mutable: bool) -> Result<Arc<dyn ListCalc>> {
        let styles = if mutable {
            ResultStyle::MUTABLE_LIST_ONLY
        } else {
            ResultStyle::LIST_MUTABLE_LIST
        };
        let list = match self.compile_as(expr, None, styles)? {
            Calc::List(calc) => calc,
            Calc::Iter(calc) => {
                debug!("draining iterable {} into a list", expr);
                return Ok(Arc::new(DrainIterCalc::new(calc)));
            }
            Calc::Generic(calc) if calc.ty().is_set() => accessor(calc),
            other => return Err(other.shape_mismatch(Shape::List)),
        };
        if mutable && list.result_style() != ResultStyle::MutableList {
            debug!("copying shared list {} for mutation", expr);
            return Ok(Arc::new(CopyListCalc::new(list)));
        }
        Ok(list)
    }

    /// Compiles a set expression to an iterable
    pub fn compile_iter(&mut self, expr: &Expr) -> Result<Arc<dyn IterCalc>> {
        match self.compile_as(expr, None, ResultStyle::ITERABLE_LIST_MUTABLE_LIST)? {
            Calc::Iter(calc) => Ok(calc),
            Calc::List(calc) => {
                debug!("iterating list {}", expr);
                Ok(Arc::new(ListIterCalc::new(calc)))
            }
            Calc::Generic(calc) if calc.ty().is_set() => Ok(accessor(calc)),
            other => Err(other.shape_mismatch(Shape::Iterable)),
        }
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    fn compile_parameter(&mut self, parameter: &Arc<Parameter>) -> Result<Calc> {
        if self.compiling_defaults.contains(&parameter.name) {
            // Reference from inside the parameter's own default
            let slot = self.parameters.get(&parameter.name).ok_or_else(|| {
                Error::internal(format!("parameter {} has no slot", parameter.name))
            })?;
            return Ok(ParameterCalc::bound_only(slot).into_calc());
        }
        let slot = self.register_parameter(parameter)?;
        Ok(ParameterCalc::new(slot).into_calc())
    }

    /// Registers `parameter`, or returns its existing slot
    ///
    /// The slot is allocated before the default expression is compiled, so a
    /// default that mentions the parameter itself resolves to the same slot.
    pub fn register_parameter(&mut self, parameter: &Arc<Parameter>) -> Result<Arc<ParameterSlot>> {
        if let Some(slot) = self.parameters.get(&parameter.name) {
            return Ok(slot.clone());
        }
        let slot = Arc::new(ParameterSlot::new(self.next_slot, parameter.clone()));
        self.next_slot += 1;
        self.parameters.insert(parameter.name.clone(), slot.clone());
        trace!("parameter {} registered in slot {}", parameter.name, slot.index());

        self.compiling_defaults.insert(parameter.name.clone());
        let default = if parameter.ty.is_scalar() {
            self.compile_scalar(&parameter.default, true)
        } else {
            let styles = self.result_styles.clone();
            self.compile_as(&parameter.default, Some(&parameter.ty), &styles)
        };
        self.compiling_defaults.remove(&parameter.name);

        match default {
            Ok(calc) => {
                slot.set_default(calc)?;
                Ok(slot)
            }
            Err(err) => {
                // Unregister, so a later compile reports the error again
                self.parameters.remove(&parameter.name);
                Err(err)
            }
        }
    }

    /// Registered parameter slots, in slot order
    pub fn parameter_slots(&self) -> Vec<Arc<ParameterSlot>> {
        let mut slots: Vec<_> = self.parameters.values().cloned().collect();
        slots.sort_by_key(|slot| slot.index());
        slots
    }
}

fn accessor(calc: Arc<dyn GenericCalc>) -> Arc<GenericAccessor> {
    Arc::new(GenericAccessor::new(calc))
}

fn is_numeric(calc: &Arc<dyn GenericCalc>) -> bool {
    calc.ty().scalar_kind().is_some_and(|kind| kind.is_numeric())
}

/// Whether a generic calc's static type allows a scalar of the kind `accept`
/// describes; untyped and null scalars are accepted
fn accepts_scalar(calc: &Arc<dyn GenericCalc>, accept: impl Fn(ScalarKind) -> bool) -> bool {
    match calc.ty().scalar_kind() {
        Some(ScalarKind::Any | ScalarKind::Null) => true,
        Some(kind) => accept(kind),
        None => false,
    }
}
