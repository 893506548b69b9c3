/// Failures converting a compiled module's compact Code section into
/// the streaming VM's instruction records.
///
/// This translator covers the instruction set `hoilc`'s code generator
/// actually emits (arithmetic, bitwise, comparisons lowered through a
/// branch, unconditional/conditional branch, call/return); the
/// remaining compact opcodes (`LOAD`/`STORE`/`LEA`/`FENCE`, `ABS`/
/// `MIN`/`MAX`/`FMA`, `SWITCH`) have no defined streaming-record
/// lowering and are rejected rather than guessed at.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] coil_format::Error),
    /// A compact opcode this translator doesn't lower.
    #[error("compact opcode {0:?} has no streaming-record translation")]
    UnsupportedOpcode(coil_asm::CompactOpcode),
    /// `SHL`/`SHR`'s shift amount must be known at translation time —
    /// the streaming `Shl`/`Shr` record packs it as a literal, not an
    /// operand address (`SPEC_FULL.md` §4.K).
    #[error("SHL/SHR's shift amount must be an immediate operand")]
    ShiftAmountNotImmediate,
    /// An instruction that must write a result (arithmetic, bitwise,
    /// comparison) was encoded with `dest == NO_REGISTER`.
    #[error("instruction has no destination register")]
    MissingDestination,
    /// A compact instruction's opcode byte or operand shape didn't
    /// match what this translator expects from `hoilc`'s code
    /// generator (an unknown opcode byte, or an operand of the wrong
    /// tag where a `BR`/`BR_COND`/`CALL` target was expected).
    #[error("malformed compact instruction")]
    MalformedInstruction,
    /// A `CALL`'s name hash didn't match any function this module
    /// declares code for (an extern function, or a hash collision).
    #[error("call target (name hash {0:#010x}) does not resolve to a locally defined function")]
    UnresolvedCallee(u32),
    /// The register/scratch layout this translator assigns overflowed
    /// the VM's static memory capacity.
    #[error("translated program needs {needed} bytes of static memory, capacity is {capacity}")]
    ProgramTooLarge { needed: usize, capacity: usize },
    /// The module has no function named `main` to run. A streaming
    /// program has no notion of "top-level statements" the way a
    /// HOIL module's declaration list does — execution has to start
    /// somewhere, so this translator requires a designated entry
    /// function the way a hosted C program does.
    #[error("module has no 'main' function to use as the streaming program's entry point")]
    NoEntryPoint,
}
