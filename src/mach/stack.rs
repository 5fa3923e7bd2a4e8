use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Stack enforced and size limited vector
///
/// Pushing past the limit is a `StackOverflow` carrying the overflow
/// message; popping an empty stack is a `StackUnderflow`.

#[derive(Clone)]
pub struct Stack<T> {
    overflow_message: &'static str,
    max_len: usize,
    vec: Vec<T>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.vec)
    }
}

impl<T> Stack<T> {
    pub fn new(max_len: usize, overflow_message: &'static str) -> Stack<T> {
        Stack {
            overflow_message,
            max_len,
            vec: Vec::with_capacity(max_len.min(64)),
        }
    }
    /// Rebuilds a stack from saved contents. More than `max_len` values is
    /// an overflow.
    pub fn from_vec(
        max_len: usize,
        overflow_message: &'static str,
        vec: Vec<T>,
    ) -> Result<Stack<T>> {
        if vec.len() > max_len {
            return Err(error!(StackOverflow; overflow_message));
        }
        let mut stack = Stack::new(max_len, overflow_message);
        stack.vec = vec;
        Ok(stack)
    }
    pub fn max_len(&self) -> usize {
        self.max_len
    }
    fn underflow_error(&self) -> Error {
        error!(StackUnderflow)
    }
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.vec.get_mut(index)
    }
    pub fn clear(&mut self) {
        self.vec.clear()
    }
    pub fn len(&self) -> usize {
        self.vec.len()
    }
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }
    pub fn is_full(&self) -> bool {
        self.vec.len() >= self.max_len
    }
    pub fn last(&self) -> Option<&T> {
        self.vec.last()
    }
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.vec.get(idx)
    }
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.vec.iter()
    }
    pub fn into_vec(self) -> Vec<T> {
        self.vec
    }
    pub fn push(&mut self, val: T) -> Result<()> {
        if self.is_full() {
            return Err(error!(StackOverflow; self.overflow_message));
        }
        self.vec.push(val);
        Ok(())
    }
    pub fn pop(&mut self) -> Result<T> {
        match self.vec.pop() {
            Some(v) => Ok(v),
            None => Err(self.underflow_error()),
        }
    }
    pub fn pop_2(&mut self) -> Result<(T, T)> {
        let two = self.pop()?;
        let one = self.pop()?;
        Ok((one, two))
    }
    pub fn pop_n(&mut self, len: usize) -> Result<Vec<T>> {
        if len > self.vec.len() {
            Err(self.underflow_error())
        } else {
            let range = (self.vec.len() - len)..;
            Ok(self.vec.drain(range).collect())
        }
    }
}
