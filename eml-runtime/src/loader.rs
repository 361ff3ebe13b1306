// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The load -> compile -> instantiate -> bind -> invoke pipeline.

use std::fs;
use std::sync::Arc;
use std::time::Instant;

use eml_error::{codes, kinds, Error, ErrorCategory, Result};
use eml_host::{CallbackRegistry, FuncSignature, HostFunction, Realm, ValueType, WasmValue};
use tracing::{debug, info, warn};
use wasmtime::{Caller, Engine, ExternType, FuncType, Linker, Module, Store, Val, ValType};

use crate::config::LoaderConfig;
use crate::instance::ModuleInstance;
use crate::location::ModuleLocation;
use crate::state::{
    ExportBindings, GuestContext, HostState, FUNCTION_TABLE_EXPORT, MALLOC_EXPORT, MEMORY_EXPORT,
};
use crate::stats::LoaderStats;
use crate::trap;

/// Raw bytes of a module image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleImage {
    name:  String,
    bytes: Vec<u8>,
}

impl ModuleImage {
    /// Wrap bytes obtained elsewhere
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }

    /// Where the image came from
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The image bytes
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A validated, compiled module
#[derive(Clone)]
pub struct CompiledModule {
    name:   String,
    module: Module,
}

impl CompiledModule {
    /// Name of the image the module was compiled from
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared imports as `(module, name)` pairs
    #[must_use]
    pub fn imports(&self) -> Vec<(String, String)> {
        self.module.imports().map(|i| (i.module().to_string(), i.name().to_string())).collect()
    }

    /// Declared export names
    #[must_use]
    pub fn exports(&self) -> Vec<String> {
        self.module.exports().map(|e| e.name().to_string()).collect()
    }
}

impl core::fmt::Debug for CompiledModule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompiledModule").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Runs module images against a host import table
pub struct Loader {
    engine: Engine,
    config: LoaderConfig,
    stats:  LoaderStats,
}

impl core::fmt::Debug for Loader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Loader").field("config", &self.config).field("stats", &self.stats).finish()
    }
}

fn value_type(ty: &ValType) -> Option<ValueType> {
    match ty {
        ValType::I32 => Some(ValueType::I32),
        ValType::I64 => Some(ValueType::I64),
        ValType::F32 => Some(ValueType::F32),
        ValType::F64 => Some(ValueType::F64),
        _ => None,
    }
}

/// The signature of `ty`, or a description of it when it uses types the
/// host cannot provide
fn signature_of(ty: &FuncType) -> core::result::Result<FuncSignature, String> {
    let params: Option<Vec<ValueType>> = ty.params().map(|t| value_type(&t)).collect();
    let results: Option<Vec<ValueType>> = ty.results().map(|t| value_type(&t)).collect();
    match (params, results) {
        (Some(params), Some(results)) => Ok(FuncSignature { params, results }),
        _ => Err(format!("({} params, {} results) using reference types", ty.params().len(), ty.results().len())),
    }
}

fn extern_kind(ty: &ExternType) -> &'static str {
    match ty {
        ExternType::Func(_) => "function",
        ExternType::Global(_) => "global",
        ExternType::Table(_) => "table",
        ExternType::Memory(_) => "memory",
        _ => "extern",
    }
}

fn from_val(val: &Val) -> Result<WasmValue> {
    match val {
        Val::I32(v) => Ok(WasmValue::I32(*v)),
        Val::I64(v) => Ok(WasmValue::I64(*v)),
        Val::F32(bits) => Ok(WasmValue::F32(f32::from_bits(*bits))),
        Val::F64(bits) => Ok(WasmValue::F64(f64::from_bits(*bits))),
        _ => Err(Error::invalid_argument("reference values cannot cross the host boundary")),
    }
}

fn to_val(value: WasmValue) -> Val {
    match value {
        WasmValue::I32(v) => Val::I32(v),
        WasmValue::I64(v) => Val::I64(v),
        WasmValue::F32(v) => Val::F32(v.to_bits()),
        WasmValue::F64(v) => Val::F64(v.to_bits()),
    }
}

/// Result slot for an entry point; the values are discarded
fn placeholder(ty: &ValType) -> Val {
    match ty {
        ValType::I64 => Val::I64(0),
        ValType::F32 => Val::F32(0),
        ValType::F64 => Val::F64(0),
        _ => Val::I32(0),
    }
}

fn host_trampoline(
    function: HostFunction,
) -> impl Fn(Caller<'_, HostState>, &[Val], &mut [Val]) -> wasmtime::Result<()> + Send + Sync + 'static {
    move |mut caller, params, results| {
        let args = params.iter().map(from_val).collect::<Result<Vec<_>>>()?;
        let mut guest = GuestContext::new(&mut caller);
        let values = function.call(&mut guest, &args)?;
        for (slot, value) in results.iter_mut().zip(values) {
            *slot = to_val(value);
        }
        Ok(())
    }
}

impl Loader {
    /// Create a loader; fuel metering is enabled when the config sets a
    /// fuel budget
    pub fn new(config: LoaderConfig) -> Result<Self> {
        let mut engine_config = wasmtime::Config::new();
        engine_config.consume_fuel(config.fuel.is_some());
        let engine = Engine::new(&engine_config).map_err(|e| {
            Error::new(ErrorCategory::Compile, codes::ENGINE_CONFIGURATION_ERROR, format!("{e:#}"))
        })?;
        Ok(Self { engine, config, stats: LoaderStats::default() })
    }

    /// The loader configuration
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Counters accumulated so far
    #[must_use]
    pub fn stats(&self) -> &LoaderStats {
        &self.stats
    }

    /// Read a module image from `location`
    pub fn load_bytes(&mut self, location: &str) -> Result<ModuleImage> {
        let location = ModuleLocation::parse(location, self.config.base_dir.as_deref())?;
        let path = location.path();
        debug!("Loading WebAssembly file: {}", location);

        let io_error = |e: std::io::Error| match e.kind() {
            std::io::ErrorKind::NotFound => kinds::module_not_found(&location.to_string()),
            _ => Error::io_error(codes::MODULE_READ_ERROR, format!("{location}: {e}")),
        };

        let size = fs::metadata(path).map_err(io_error)?.len();
        let max = self.config.max_module_bytes;
        if size > max as u64 {
            return Err(kinds::module_too_large(usize::try_from(size).unwrap_or(usize::MAX), max));
        }

        let load_start = Instant::now();
        let bytes = fs::read(path).map_err(io_error)?;
        info!("Loaded {} bytes of WebAssembly code in {:?}", bytes.len(), load_start.elapsed());

        self.stats.images_loaded += 1;
        self.stats.bytes_read += bytes.len() as u64;
        Ok(ModuleImage::new(location.to_string(), bytes))
    }

    /// Validate and compile an image
    pub fn compile(&mut self, image: &ModuleImage) -> Result<CompiledModule> {
        if image.bytes.len() > self.config.max_module_bytes {
            return Err(kinds::module_too_large(image.bytes.len(), self.config.max_module_bytes));
        }
        let compile_start = Instant::now();
        let module = Module::from_binary(&self.engine, &image.bytes)
            .map_err(|e| Error::compile_error(format!("{}: {e:#}", image.name)))?;
        info!("Compiled {} in {:?}", image.name, compile_start.elapsed());

        self.stats.modules_compiled += 1;
        Ok(CompiledModule { name: image.name.clone(), module })
    }

    /// Link `module` against `imports` and create an instance.
    ///
    /// Every import the module declares must be a function present in
    /// `imports` with the same signature.
    pub fn instantiate(
        &mut self,
        module: &CompiledModule,
        imports: &Arc<CallbackRegistry>,
    ) -> Result<ModuleInstance> {
        let mut linker: Linker<HostState> = Linker::new(&self.engine);
        for import in module.module.imports() {
            let (import_module, name) = (import.module(), import.name());
            let ty = import.ty();
            let ExternType::Func(func_ty) = &ty else {
                return Err(kinds::unsupported_import_kind(import_module, name, extern_kind(&ty)));
            };
            let Some(function) = imports.host_function(import_module, name) else {
                return Err(kinds::missing_import(import_module, name));
            };
            let expected = function.signature();
            match signature_of(func_ty) {
                Ok(found) if &found == expected => {}
                Ok(found) => {
                    return Err(kinds::import_type_mismatch(
                        import_module,
                        name,
                        &expected.to_string(),
                        &found.to_string(),
                    ));
                }
                Err(found) => {
                    return Err(kinds::import_type_mismatch(import_module, name, &expected.to_string(), &found));
                }
            }
            debug!("  - Import: {}.{} {}", import_module, name, expected);
            linker
                .func_new(import_module, name, func_ty.clone(), host_trampoline(function.clone()))
                .map_err(|e| Error::link_error(codes::INSTANTIATION_ERROR, format!("{e:#}")))?;
        }

        let mut realm = Realm::new(imports.clone());
        realm.set_label(module.name.clone());
        let mut store = Store::new(&self.engine, HostState::new(realm, self.config.max_memory_pages));
        if let Some(fuel) = self.config.fuel {
            store
                .set_fuel(fuel)
                .map_err(|e| Error::new(ErrorCategory::Compile, codes::ENGINE_CONFIGURATION_ERROR, format!("{e:#}")))?;
        }

        let inst_start = Instant::now();
        let created = linker.instantiate(&mut store, &module.module);
        if let Some(fuel) = self.config.fuel {
            self.stats.fuel_consumed += fuel.saturating_sub(store.get_fuel().unwrap_or(0));
        }
        let inner = created.map_err(|e| {
            if trap::is_guest_failure(&e) {
                trap::from_wasmtime(&e)
            } else {
                Error::link_error(codes::INSTANTIATION_ERROR, format!("{}: {e:#}", module.name))
            }
        })?;
        let instance =
            ModuleInstance { store, instance: inner, name: module.name.clone(), fuel: self.config.fuel };
        info!("Module {} instantiated in {:?}", module.name, inst_start.elapsed());

        self.stats.instances_created += 1;
        Ok(instance)
    }

    /// Capture the instance exports the host needs to call back into the
    /// module
    pub fn bind_exports(&mut self, instance: &mut ModuleInstance) -> Result<()> {
        let inner = instance.instance;
        let store = &mut instance.store;
        let memory = inner.get_memory(&mut *store, MEMORY_EXPORT);
        let malloc = match inner.get_func(&mut *store, MALLOC_EXPORT) {
            Some(func) => match func.typed::<u32, u32>(&*store) {
                Ok(typed) => Some(typed),
                Err(_) => {
                    warn!("Ignoring `{MALLOC_EXPORT}` export with unexpected signature");
                    None
                }
            },
            None => None,
        };
        let table = inner.get_table(&mut *store, FUNCTION_TABLE_EXPORT);
        let names: Vec<String> = inner.exports(&mut *store).map(|e| e.name().to_string()).collect();

        if memory.is_none() {
            warn!("Module {} exports no `{MEMORY_EXPORT}`; host functions touching memory will fail", instance.name);
        }
        debug!("Bound {} exports of {}", names.len(), instance.name);
        self.stats.exports_bound += names.len() as u64;
        store.data_mut().exports = Some(ExportBindings { memory, malloc, table, names });
        Ok(())
    }

    /// Call the export `name` with no arguments.
    ///
    /// Every failure, including a missing export, is a runtime trap.
    pub fn invoke_entry_point(&mut self, instance: &mut ModuleInstance, name: &str) -> Result<()> {
        let func = instance
            .instance
            .get_func(&mut instance.store, name)
            .ok_or_else(|| kinds::entry_point_not_found(name))?;
        let ty = func.ty(&instance.store);
        if ty.params().len() != 0 {
            return Err(Error::runtime_trap(
                codes::ENTRY_POINT_NOT_CALLABLE,
                format!("export `{name}` takes {} parameters", ty.params().len()),
            ));
        }
        let mut results: Vec<Val> = ty.results().map(|t| placeholder(&t)).collect();

        info!("Executing function: {}", name);
        let exec_start = Instant::now();
        instance.refuel()?;
        let outcome = func.call(&mut instance.store, &[], &mut results);
        let fuel = instance.consumed_fuel();
        self.stats.fuel_consumed += fuel;
        self.stats.entry_points_invoked += 1;

        match outcome {
            Ok(()) => {
                info!("Function {} completed in {:?} ({} fuel)", name, exec_start.elapsed(), fuel);
                Ok(())
            }
            Err(e) => {
                let error = trap::from_wasmtime(&e);
                warn!("Function {} failed after {:?}: {}", name, exec_start.elapsed(), error);
                Err(error)
            }
        }
    }

    /// Run the whole pipeline on `location` and the configured entry point
    pub fn run(&mut self, location: &str, imports: &Arc<CallbackRegistry>) -> Result<ModuleInstance> {
        let image = self.load_bytes(location)?;
        let module = self.compile(&image)?;
        let mut instance = self.instantiate(&module, imports)?;
        self.bind_exports(&mut instance)?;
        let entry_point = self.config.entry_point.clone();
        self.invoke_entry_point(&mut instance, &entry_point)?;
        Ok(instance)
    }
}
