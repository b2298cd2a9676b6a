//! Agent operations
//!
//! `send`/`send-off` enqueue `(f, args...)` on the agent's FIFO and,
//! when the enqueue claims the processing flag, submit a drain worker
//! to the shared pool. Both share the single pool here. `await` blocks
//! until the listed agents have empty queues and no running worker;
//! `await-for` is the bounded variant returning nil on timeout.

use crate::pool;
use clove_core::error::Error;
use clove_core::refs::agent::{await_for_deadline, Agent, AgentAction, ErrorMode};
use clove_core::value::Value;
use std::sync::Arc;

fn as_agent<'a>(v: &'a Value, op: &str) -> Result<&'a Arc<Agent>, Error> {
    match v {
        Value::Agent(a) => Ok(a),
        other => Err(Error::type_err(format!(
            "{op} expects an agent, got {}",
            other.type_name()
        ))),
    }
}

fn schedule_drain(handle: Value) -> Result<(), Error> {
    pool::submit(move || Agent::drain(&handle))
}

/// `send`
pub fn send(handle: &Value, f: Value, args: Vec<Value>) -> Result<Value, Error> {
    let agent = as_agent(handle, "send")?;
    if agent.enqueue(AgentAction { func: f, args })? {
        schedule_drain(handle.clone())?;
    }
    Ok(handle.clone())
}

/// `send-off`: identical to `send` here; both ride the shared pool.
pub fn send_off(handle: &Value, f: Value, args: Vec<Value>) -> Result<Value, Error> {
    send(handle, f, args)
}

/// `await`: block until every listed agent has quiesced.
pub fn await_agents(handles: &[Value]) -> Result<Value, Error> {
    for handle in handles {
        as_agent(handle, "await")?.await_quiesced();
    }
    Ok(Value::Nil)
}

/// `await-for`: bounded await with one shared deadline. Returns true on
/// success, nil on timeout.
pub fn await_for(timeout_ms: u64, handles: &[Value]) -> Result<Value, Error> {
    let deadline = await_for_deadline(timeout_ms);
    for handle in handles {
        if !as_agent(handle, "await-for")?.await_quiesced_until(deadline) {
            return Ok(Value::Nil);
        }
    }
    Ok(Value::Bool(true))
}

/// `restart-agent`: clear the error, install a new state, resume any
/// actions still queued.
pub fn restart_agent(handle: &Value, new_state: Value, clear_actions: bool) -> Result<Value, Error> {
    let agent = as_agent(handle, "restart-agent")?;
    if agent.restart(new_state.clone(), clear_actions)? {
        schedule_drain(handle.clone())?;
    }
    Ok(new_state)
}

/// `agent-error`
pub fn agent_error(handle: &Value) -> Result<Value, Error> {
    Ok(as_agent(handle, "agent-error")?
        .error()
        .unwrap_or(Value::Nil))
}

/// `set-error-handler!`
pub fn set_error_handler(handle: &Value, handler: Value) -> Result<Value, Error> {
    let agent = as_agent(handle, "set-error-handler!")?;
    agent.set_error_handler(if handler.is_nil() { None } else { Some(handler) });
    Ok(Value::Nil)
}

/// `set-error-mode!`: accepts `:continue` or `:fail`.
pub fn set_error_mode(handle: &Value, mode: &Value) -> Result<Value, Error> {
    let agent = as_agent(handle, "set-error-mode!")?;
    let parsed = match mode {
        Value::Keyword(k) if k.ns().is_none() && k.name() == "continue" => ErrorMode::Continue,
        Value::Keyword(k) if k.ns().is_none() && k.name() == "fail" => ErrorMode::Fail,
        other => {
            return Err(Error::value_err(format!(
                "Unknown error mode: {}",
                clove_core::printer::pr_str(other, true)
            )))
        }
    };
    agent.set_error_mode(parsed);
    Ok(Value::Nil)
}
