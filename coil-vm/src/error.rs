use coil_asm::DecodeError;
use coil_types::IoError;

/// Every failure mode the VM executor and debugger kernel can surface
/// (`SPEC_FULL.md` §7, the `Runtime` kind and friends). A `Runtime`
/// failure is fatal: the executor halts the VM (`State::halt`) and
/// returns control to its caller rather than unwinding silently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A host read/write failed, or a streaming record was framed
    /// incorrectly (bad marker, short read, unknown opcode).
    #[error(transparent)]
    Io(#[from] IoError),
    /// Forwarded from the streaming instruction codec (component C).
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// A static-memory access fell outside `0..STATIC_MEMORY_SIZE`.
    #[error("static memory access out of bounds: offset {offset}, len {len}, capacity {capacity}")]
    MemoryOutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },
    /// `PUSH` grew the data stack past its capacity.
    #[error("data stack overflow (capacity {capacity} bytes)")]
    StackOverflow { capacity: usize },
    /// `POP` was asked for more bytes than are on the data stack.
    #[error("data stack underflow")]
    StackUnderflow,
    /// `CALL` grew the call stack past its capacity.
    #[error("call stack overflow (capacity {capacity} frames)")]
    CallStackOverflow { capacity: usize },
    /// `RET` was executed with nothing on the call stack.
    #[error("call stack underflow")]
    CallStackUnderflow,
    /// `DIV`/`MOD` with a zero divisor.
    #[error("division by zero")]
    DivideByZero,
    /// The label-collection pass (`SPEC_FULL.md` §4.K) found the same
    /// label id defined twice.
    #[error("duplicate label id {0}")]
    DuplicateLabel(u16),
    /// `JMP`/`J**`/`CALL` named a label id the collection pass never saw.
    #[error("unknown label id {0}")]
    UnknownLabel(u16),
    /// The label table filled up during collection.
    #[error("label table is full (capacity {capacity})")]
    LabelTableFull { capacity: usize },
    /// `SYSCALL` named an id this VM doesn't implement.
    #[error("unknown syscall id {0}")]
    UnknownSyscall(u16),
    /// `SYSCALL 1` (`write`) named a file descriptor other than stdout
    /// or stderr — this VM has no general file-descriptor table.
    #[error("unsupported file descriptor {0}")]
    BadFileDescriptor(u16),
    /// A debugger command named a breakpoint set already at its cap.
    #[error("breakpoint set is full (capacity {capacity})")]
    BreakpointSetFull { capacity: usize },
    /// A jump, call, return, or `goto` landed outside the program
    /// stream (a corrupt label table, or a debugger `goto` to a
    /// position past the end of the loaded program).
    #[error("position {0} is outside the program stream")]
    InvalidPosition(usize),
}
