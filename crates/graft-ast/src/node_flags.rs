//! Modifier and engine bookkeeping bits carried on every node.

use bitflags::bitflags;

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct NodeFlags: u32 {
        const PUBLIC = 1 << 0;
        const PRIVATE = 1 << 1;
        const PROTECTED = 1 << 2;
        const STATIC = 1 << 3;
        const FINAL = 1 << 4;
        const ABSTRACT = 1 << 5;
        const TRANSIENT = 1 << 6;

        /// Method node is a constructor.
        const CONSTRUCTOR = 1 << 8;
        /// Constructor synthesized by the host when a class declares none.
        /// Injecting a generated constructor removes members carrying this.
        const DEFAULT_CONSTRUCTOR = 1 << 9;
        /// Node was synthesized by the transformation engine.
        const GENERATED = 1 << 10;
        /// On a method body: the host must not re-parse it.
        const NO_REPARSE = 1 << 11;
    }
}

impl NodeFlags {
    pub fn visibility(&self) -> NodeFlags {
        *self & (NodeFlags::PUBLIC | NodeFlags::PRIVATE | NodeFlags::PROTECTED)
    }

    pub fn is_static(&self) -> bool {
        self.contains(NodeFlags::STATIC)
    }

    pub fn is_final(&self) -> bool {
        self.contains(NodeFlags::FINAL)
    }
}
