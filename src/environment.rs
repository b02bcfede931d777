use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::iter;
use std::rc::Rc;

use crate::Error;
use crate::ast::{Function, Value};

/// Name to value bindings owned by one scope, kept in definition order.
///
/// Cloning deep-copies every bound value. A lambda stores its captured
/// arguments here; a call frame starts from a copy of them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bindings {
    entries: Vec<(String, Value)>,
}

impl Bindings {
    pub fn new() -> Self {
        Bindings::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Replace the value bound to `name`, or append a new binding
    pub fn put(&mut self, name: &str, value: Value) {
        match self.entries.iter_mut().find(|(bound, _)| bound == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name.to_owned(), value)),
        }
    }

    /// First name bound to a function structurally equal to `function`
    pub fn name_of(&self, function: &Function) -> Option<&str> {
        self.entries.iter().find_map(|(name, value)| match value {
            Value::Function(bound) if bound == function => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output and diagnostic sinks of one interpreter session.
pub struct Console {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl Console {
    pub fn new(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Console { out, err }
    }

    /// Console writing to the process stdout and stderr
    pub fn stdio() -> Self {
        Console::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Write one line to the output sink
    pub fn print_line(&mut self, line: &str) {
        if let Err(err) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            tracing::warn!(%err, "failed to write to output");
        }
    }

    /// Write one line to the diagnostic sink
    pub fn report_line(&mut self, line: &str) {
        if let Err(err) = writeln!(self.err, "{line}").and_then(|()| self.err.flush()) {
            tracing::warn!(%err, "failed to write diagnostic");
        }
    }
}

/// In-memory sink whose clones share one buffer, for capturing a console.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        SharedBuffer::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for Console {
    fn default() -> Self {
        Console::stdio()
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Console(<sinks>)")
    }
}

/// One link of the scope chain, walked iteratively so lookups from deep
/// call frames use constant stack.
trait Scope {
    fn local(&self) -> &Bindings;
    fn parent(&self) -> Option<&dyn Scope>;
    fn link_mut(&mut self) -> Link<'_>;
}

/// Mutable view of where a scope's chain continues.
enum Link<'s> {
    Root {
        bindings: &'s mut Bindings,
        console: &'s mut Console,
    },
    Caller(&'s mut dyn Scope),
}

/// What lies outside an environment's own bindings.
enum Outer<'p> {
    /// Session root; owns the console
    Root(Console),
    /// Call frame; borrows the calling environment for the duration of the call
    Caller(&'p mut dyn Scope),
}

/// Environment for variable bindings
///
/// The root environment lives for the whole session and owns the console. A
/// call frame borrows the environment it was called from, so the parent link
/// exists exactly as long as the call and is never stored in a value.
pub struct Environment<'p> {
    bindings: Bindings,
    outer: Outer<'p>,
}

impl Environment<'static> {
    /// Empty root environment writing to stdout/stderr
    pub fn new() -> Self {
        Environment::with_console(Console::stdio())
    }

    pub fn with_console(console: Console) -> Self {
        Environment {
            bindings: Bindings::new(),
            outer: Outer::Root(console),
        }
    }
}

impl Default for Environment<'static> {
    fn default() -> Self {
        Environment::new()
    }
}

impl<'p> Environment<'p> {
    /// Call frame over `bindings` whose parent is `caller`
    pub fn call_frame(bindings: Bindings, caller: &'p mut Environment<'_>) -> Self {
        Environment {
            bindings,
            outer: Outer::Caller(caller),
        }
    }

    /// Bindings of this scope followed by those of every enclosing scope
    fn chain(&self) -> impl Iterator<Item = &Bindings> {
        iter::successors(Some(self as &dyn Scope), |&scope| scope.parent())
            .map(|scope| scope.local())
    }

    /// The root scope's bindings and console
    fn root_mut(&mut self) -> (&mut Bindings, &mut Console) {
        let mut scope: &mut dyn Scope = self;
        loop {
            let current = scope;
            match current.link_mut() {
                Link::Root { bindings, console } => return (bindings, console),
                Link::Caller(parent) => scope = parent,
            }
        }
    }

    /// Look `name` up through the parent chain, returning a copy.
    /// A miss yields an unbound symbol error value.
    pub fn get(&self, name: &str) -> Value {
        match self.chain().find_map(|bindings| bindings.get(name)) {
            Some(value) => value.clone(),
            None => Error::Unbound(name.to_owned()).into(),
        }
    }

    /// Bind in this scope only
    pub fn put(&mut self, name: &str, value: Value) {
        self.bindings.put(name, value);
    }

    /// Bind in the root scope
    pub fn def(&mut self, name: &str, value: Value) {
        self.root_mut().0.put(name, value);
    }

    /// Reverse lookup of the name a function is bound to, for display
    pub fn name_of(&self, function: &Function) -> Option<&str> {
        self.chain().find_map(|bindings| bindings.name_of(function))
    }

    pub fn console(&mut self) -> &mut Console {
        self.root_mut().1
    }

    /// This scope's own bindings
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn is_root(&self) -> bool {
        matches!(self.outer, Outer::Root(_))
    }
}

impl Scope for Environment<'_> {
    fn local(&self) -> &Bindings {
        &self.bindings
    }

    fn parent(&self) -> Option<&dyn Scope> {
        match &self.outer {
            Outer::Root(_) => None,
            Outer::Caller(parent) => Some(&**parent),
        }
    }

    fn link_mut(&mut self) -> Link<'_> {
        match &mut self.outer {
            Outer::Root(console) => Link::Root {
                bindings: &mut self.bindings,
                console,
            },
            Outer::Caller(parent) => Link::Caller(&mut **parent),
        }
    }
}

impl fmt::Debug for Environment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("bindings", &self.bindings)
            .field("root", &self.is_root())
            .finish()
    }
}
