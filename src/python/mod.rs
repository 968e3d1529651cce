//! Python bindings for dlr-graph using PyO3
//!
//! Payloads are arbitrary Python objects. Each `Op` returned to Python owns
//! one node handle; when Python drops the `Op`, its `Drop` releases that
//! handle, which is the host release callback.
//!
//! # Usage from Python
//!
//! ```python
//! import dlr_graph
//!
//! ctx = dlr_graph.Context()
//! x = ctx.create_node(1, [1.0, 2.0])
//! y = ctx.create_node(2)          # virtual
//! ctx.add_inputs(2, [1])
//!
//! print(ctx.node_inputs(2))      # [1]
//! print(ctx.vertices())          # 2
//! print(ctx.dump())              # -> 1 -> 2
//! ```
//!
//! Payloads freed by a release are dropped only after the context lock is
//! released, so a payload may itself hold `Op`s of the same context.

use std::sync::{Arc, MutexGuard};

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use tracing::warn;

use crate::error::GraphError;
use crate::graph::{ContextConfig, GraphContext, NodeHandle, SharedContext, WiringMode};

type PyGraph = GraphContext<PyObject>;

impl From<GraphError> for PyErr {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Lock(_) => PyRuntimeError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

fn lock(shared: &SharedContext<PyObject>) -> Result<MutexGuard<'_, PyGraph>, GraphError> {
    shared.lock().map_err(|e| GraphError::Lock(e.to_string()))
}

// ============================================================================
// Python-exposed classes
// ============================================================================

/// A computational graph.
#[pyclass(name = "Context")]
pub struct PyContext {
    inner: SharedContext<PyObject>,
}

#[pymethods]
impl PyContext {
    /// Create an empty context.
    ///
    /// Args:
    ///     strict_identities: reject identities already in use
    ///     legacy_wiring: keep at most two inputs per node (old behaviour)
    #[new]
    #[pyo3(signature = (strict_identities = false, legacy_wiring = false))]
    fn new(strict_identities: bool, legacy_wiring: bool) -> Self {
        let config = ContextConfig {
            wiring: if legacy_wiring {
                WiringMode::Legacy
            } else {
                WiringMode::Append
            },
            strict_identities,
            ..ContextConfig::default()
        };
        Self {
            inner: GraphContext::with_config(config).into_shared(),
        }
    }

    /// Create a node; omit `value` for a virtual node.
    #[pyo3(signature = (identity, value = None))]
    fn create_node(&self, identity: i32, value: Option<PyObject>) -> PyResult<PyOp> {
        let inserted = {
            let mut ctx = lock(&self.inner)?;
            if ctx.config().strict_identities {
                ctx.try_insert(identity, value)
            } else {
                Ok(ctx.create_node(identity, value))
            }
        };
        // a rejected value is dropped here, with the lock already released
        let handle = inserted.map_err(|(err, _rejected)| PyErr::from(err))?;

        Ok(PyOp {
            context: Arc::clone(&self.inner),
            handle,
            identity,
        })
    }

    /// Wire `inputs` as inputs of node `identity`; returns edges wired.
    fn add_inputs(&self, identity: i32, inputs: Vec<i32>) -> PyResult<usize> {
        let mut dropped = Vec::new();
        let wired = lock(&self.inner)?.add_inputs_into(identity, &inputs, &mut dropped);
        drop(dropped);
        Ok(wired)
    }

    /// Number of nodes ever created.
    fn vertices(&self) -> PyResult<usize> {
        Ok(lock(&self.inner)?.vertex_count())
    }

    /// Value stored on node `identity`, or None.
    fn get_value(&self, py: Python<'_>, identity: i32) -> PyResult<Option<PyObject>> {
        let ctx = lock(&self.inner)?;
        Ok(ctx.payload(identity).map(|v| v.clone_ref(py)))
    }

    /// Identities of the inputs of node `identity`.
    fn node_inputs(&self, identity: i32) -> PyResult<Vec<i32>> {
        Ok(lock(&self.inner)?.node_inputs(identity))
    }

    /// Identities of the nodes consuming node `identity`.
    fn node_outputs(&self, identity: i32) -> PyResult<Vec<i32>> {
        Ok(lock(&self.inner)?.node_outputs(identity))
    }

    /// Node identities in creation order.
    fn dump(&self) -> PyResult<String> {
        Ok(lock(&self.inner)?.dump())
    }

    /// Free unreachable nodes, cycles included; returns nodes freed.
    fn sweep(&self) -> PyResult<usize> {
        let mut dropped = Vec::new();
        let freed = lock(&self.inner)?.sweep_into(&mut dropped);
        drop(dropped);
        Ok(freed)
    }

    fn __len__(&self) -> PyResult<usize> {
        Ok(lock(&self.inner)?.live_count())
    }

    fn __str__(&self) -> PyResult<String> {
        self.dump()
    }

    fn __repr__(&self) -> PyResult<String> {
        let ctx = lock(&self.inner)?;
        Ok(format!(
            "Context(vertices={}, live={})",
            ctx.vertex_count(),
            ctx.live_count()
        ))
    }
}

/// Handle to one node of a Context.
#[pyclass(name = "Op")]
pub struct PyOp {
    context: SharedContext<PyObject>,
    handle: NodeHandle,
    identity: i32,
}

#[pymethods]
impl PyOp {
    /// Caller-assigned identity.
    #[getter]
    fn identity(&self) -> i32 {
        self.identity
    }

    /// True if the node carries no value.
    #[getter]
    fn is_virtual(&self) -> PyResult<bool> {
        let ctx = lock(&self.context)?;
        Ok(ctx.node(self.handle)?.is_virtual())
    }

    /// Identities of this node's inputs.
    fn inputs(&self) -> PyResult<Vec<i32>> {
        Ok(lock(&self.context)?.inputs_of(self.handle)?)
    }

    fn __repr__(&self) -> String {
        format!("Op(identity={})", self.identity)
    }
}

impl Drop for PyOp {
    fn drop(&mut self) {
        // freed payloads may own other Ops of this context, whose Drop locks
        // it again; they are dropped only after the guard is gone
        let mut dropped = Vec::new();
        let released =
            lock(&self.context).and_then(|mut ctx| ctx.release_into(self.handle, &mut dropped));
        if let Err(e) = released {
            warn!(identity = self.identity, error = %e, "release callback failed");
        }
        drop(dropped);
    }
}

// ============================================================================
// Python-exposed functions
// ============================================================================

/// Get the version of this library.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// Module registration
// ============================================================================

/// Computational graph storage implemented in Rust.
#[pymodule]
#[pyo3(name = "dlr_graph")]
fn dlr_graph_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyContext>()?;
    m.add_class::<PyOp>()?;
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
