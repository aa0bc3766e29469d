// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

macro_rules! opcodes {
    ($($(#[$meta:meta])* $name:ident = $value:literal,)*) => {
        /// Instruction tag stored in the low half of a header [`Node`](crate::Node).
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum Opcode {
            $($(#[$meta])* $name = $value,)*
        }

        impl Opcode {
            /// Every opcode, in numeric order.
            pub const ALL: &'static [Self] = &[$(Self::$name,)*];

            /// Converts a raw tag back into an opcode.
            pub fn from_u16(value: u16) -> Option<Self> {
                match value {
                    $($value => Some(Self::$name),)*
                    _ => None,
                }
            }

            /// The upper-case mnemonic used by the disassembler.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)*
                }
            }
        }
    };
}

opcodes! {
    /// Padding; also the tag of a zeroed cell.
    Nop = 0,
    /// A deferred error raised on replay.
    Error = 1,
    /// Link to the next block of the chain.
    Continue = 2,
    /// Terminates the list.
    EndOfList = 3,
    CallList = 4,
    CallLists = 5,
    ListBase = 6,
    VertexList = 7,
    VertexListCopyCurrent = 8,
    VertexListLoopback = 9,

    Accum = 16,
    AlphaFunc = 17,
    BlendColor = 18,
    BlendFunc = 19,
    Clear = 20,
    ClearColor = 21,
    ClearDepth = 22,
    ColorMask = 23,
    CullFace = 24,
    DepthFunc = 25,
    DepthMask = 26,
    DepthRange = 27,
    Disable = 28,
    Enable = 29,
    Fog = 30,
    FrontFace = 31,
    Hint = 32,
    Light = 33,
    LightModel = 34,
    LineStipple = 35,
    LineWidth = 36,
    Material = 37,
    PointSize = 38,
    PolygonMode = 39,
    PopAttrib = 40,
    PushAttrib = 41,
    Scissor = 42,
    ShadeModel = 43,
    StencilFunc = 44,
    StencilMask = 45,
    StencilOp = 46,
    Viewport = 47,

    Frustum = 64,
    LoadIdentity = 65,
    LoadMatrix = 66,
    MatrixMode = 67,
    MultMatrix = 68,
    Ortho = 69,
    PopMatrix = 70,
    PushMatrix = 71,
    Rotate = 72,
    Scale = 73,
    Translate = 74,

    Attr1f = 96,
    Attr2f = 97,
    Attr3f = 98,
    Attr4f = 99,
    RasterPos = 100,

    BindTexture = 128,
    Bitmap = 129,
    DrawPixels = 130,
    PolygonStipple = 131,
    TexImage2d = 132,
    TexParameter = 133,
    TexSubImage2d = 134,

    ProgramString = 160,
    Uniform1d = 161,
    Uniform1i64 = 162,
    Uniform1ui64 = 163,
    Uniform4fv = 164,
    UseProgram = 165,
}

impl Opcode {
    /// Returns `true` for the three vertex batch tags.
    pub fn is_vertex_list(self) -> bool {
        matches!(
            self,
            Self::VertexList | Self::VertexListCopyCurrent | Self::VertexListLoopback
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Opcode;

    #[test]
    fn raw_tags_round_trip() {
        for &op in Opcode::ALL {
            assert_eq!(Opcode::from_u16(op as u16), Some(op));
        }
        assert_eq!(Opcode::from_u16(0xfffe), None);
    }

    #[test]
    fn zeroed_cell_is_a_nop() {
        assert_eq!(Opcode::from_u16(0), Some(Opcode::Nop));
    }
}
