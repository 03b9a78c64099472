//! Explicit call stack and "call the overridden implementation".
//!
//! Every action invocation pushes a [`Frame`] naming the receiving object
//! (`this`), the implementation that declares the running action, the action
//! name and its arguments. [`CallStack::call_parent`] reads the top-most
//! frame that is not a convenience wrapper and runs the same action on the
//! declaring implementation's parent, with `this` preserved.
//!
//! ```text
//!   parent_return        ← helper frame, skipped
//!   call_parent          ← helper frame, skipped
//!   show  @ Dashboard_3Audi (this = Dashboard_3Audi)   ← real caller
//!         └─ parent ──► show @ Dashboard_Base, args truncated to its arity
//! ```

use crate::controller::{Controller, find_declaring};
use crate::error::{FrameworkError, Result};
use crate::response::{Payload, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

pub const CALL_PARENT: &str = "call_parent";
pub const PARENT_RESPONSE: &str = "parent_response";
pub const PARENT_RETURN: &str = "parent_return";

#[derive(Clone)]
pub struct Frame {
    pub this: Rc<dyn Controller>,
    pub declaring: Rc<dyn Controller>,
    pub method: String,
    pub args: Vec<Value>,
}

impl Frame {
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            component: self.declaring.descriptor().type_name(),
            method: self.method.clone(),
            args: self.args.clone(),
        }
    }
}

/// Printable copy of a frame, kept for failure reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub component: String,
    pub method: String,
    pub args: Vec<Value>,
}

pub struct CallStack {
    frames: RefCell<Vec<Frame>>,
    helpers: Vec<String>,
    failure: RefCell<Vec<FrameSnapshot>>,
}

struct FrameGuard<'s>(&'s CallStack);

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.0.frames.borrow_mut().pop();
    }
}

impl CallStack {
    /// `helpers` are the frame names skipped when looking for the real caller.
    pub fn new(helpers: Vec<String>) -> Self {
        Self {
            frames: RefCell::new(Vec::new()),
            helpers,
            failure: RefCell::new(Vec::new()),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Innermost-first frames active when the last failure was raised.
    pub fn take_failure_trace(&self) -> Vec<FrameSnapshot> {
        std::mem::take(&mut *self.failure.borrow_mut())
    }

    pub(crate) fn clear(&self) {
        self.frames.borrow_mut().clear();
        self.failure.borrow_mut().clear();
    }

    fn push(&self, frame: Frame) -> FrameGuard<'_> {
        self.frames.borrow_mut().push(frame);
        FrameGuard(self)
    }

    fn record_failure(&self) {
        let mut failure = self.failure.borrow_mut();
        if failure.is_empty() {
            *failure = self.frames.borrow().iter().rev().map(Frame::snapshot).collect();
        }
    }

    fn is_helper(&self, method: &str) -> bool {
        self.helpers.iter().any(|helper| helper == method)
    }

    /// Invoke `action` on `this`, resolving it along the parent chain.
    pub fn invoke(&self, this: &Rc<dyn Controller>, action: &str, args: Vec<Value>) -> Result<Response> {
        let (declaring, _) =
            find_declaring(this, action).ok_or_else(|| FrameworkError::ActionNotFound {
                controller: this.descriptor().type_name(),
                action: action.to_string(),
            })?;
        self.invoke_on(this, &declaring, action, args)
    }

    fn invoke_on(
        &self,
        this: &Rc<dyn Controller>,
        declaring: &Rc<dyn Controller>,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Response> {
        let _guard = self.push(Frame {
            this: Rc::clone(this),
            declaring: Rc::clone(declaring),
            method: method.to_string(),
            args: args.clone(),
        });
        let call = ActionCall {
            stack: self,
            this,
            declaring,
            method,
            args: &args,
        };
        declaring
            .call_declared(method, &call)
            .inspect_err(|_| self.record_failure())
    }

    fn with_helper<T>(
        &self,
        name: &str,
        call: &ActionCall<'_>,
        body: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let _guard = self.push(Frame {
            this: Rc::clone(call.this),
            declaring: Rc::clone(call.declaring),
            method: name.to_string(),
            args: Vec::new(),
        });
        body().inspect_err(|_| self.record_failure())
    }

    /// Run the overridden implementation of the action currently executing.
    pub fn call_parent(&self) -> Result<Response> {
        let caller = self
            .frames
            .borrow()
            .iter()
            .rev()
            .find(|frame| !self.is_helper(&frame.method))
            .cloned()
            .ok_or_else(|| FrameworkError::logic("could not determine the calling action"))?;

        let owner = caller.declaring.descriptor().type_name();
        let parent = caller.declaring.parent().cloned().ok_or_else(|| {
            FrameworkError::logic(format!("{owner} has no parent implementation"))
        })?;
        let (target, arity) = find_declaring(&parent, &caller.method).ok_or_else(|| {
            FrameworkError::logic(format!(
                "method {} does not exist in the parent of {owner}",
                caller.method
            ))
        })?;

        let mut args = caller.args;
        args.truncate(arity);
        debug!(
            method = %caller.method,
            from = %owner,
            to = %target.descriptor().type_name(),
            arity,
            "calling parent implementation"
        );
        self.invoke_on(&caller.this, &target, &caller.method, args)
    }
}

/// What an action body sees of its own invocation.
pub struct ActionCall<'a> {
    stack: &'a CallStack,
    this: &'a Rc<dyn Controller>,
    declaring: &'a Rc<dyn Controller>,
    method: &'a str,
    args: &'a [Value],
}

impl<'a> ActionCall<'a> {
    pub fn method(&self) -> &str {
        self.method
    }

    pub fn args(&self) -> &[Value] {
        self.args
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.arg(index).and_then(Value::as_str)
    }

    /// The receiving object; virtual calls go through it.
    pub fn this(&self) -> &Rc<dyn Controller> {
        self.this
    }

    /// The implementation declaring the running action.
    pub fn declaring(&self) -> &Rc<dyn Controller> {
        self.declaring
    }

    /// Invoke another action on `this`.
    pub fn invoke(&self, action: &str, args: Vec<Value>) -> Result<Response> {
        self.stack.invoke(self.this, action, args)
    }

    pub fn call_parent(&self) -> Result<Response> {
        self.stack
            .with_helper(CALL_PARENT, self, || self.stack.call_parent())
    }

    /// The parent implementation's full response.
    pub fn parent_return(&self) -> Result<Response> {
        self.stack.with_helper(PARENT_RETURN, self, || self.call_parent())
    }

    /// Only the parent implementation's payload, to be decorated and
    /// re-wrapped by the caller.
    pub fn parent_response(&self) -> Result<Payload> {
        self.stack.with_helper(PARENT_RESPONSE, self, || {
            self.parent_return().map(|response| response.payload)
        })
    }
}
