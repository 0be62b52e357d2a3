use std::fmt;

/// Operation codes carried in the `opcode` and `req_opcode` header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    None = 0,
    TerminateSession = 1,
    ResetSessions = 2,
    ListDirectory = 3,
    OpenFileRo = 4,
    ReadFile = 5,
    RemoveFile = 8,
    RemoveDirectory = 10,
    CalcFileCrc32 = 14,
    Ack = 128,
    Nak = 129,
}

impl Opcode {
    /// True for the two response kinds a server sends back
    pub fn is_response(self) -> bool {
        matches!(self, Opcode::Ack | Opcode::Nak)
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::None => "NONE",
            Opcode::TerminateSession => "TERMINATE_SESSION",
            Opcode::ResetSessions => "RESET_SESSIONS",
            Opcode::ListDirectory => "LIST_DIRECTORY",
            Opcode::OpenFileRo => "OPEN_FILE_RO",
            Opcode::ReadFile => "READ_FILE",
            Opcode::RemoveFile => "REMOVE_FILE",
            Opcode::RemoveDirectory => "REMOVE_DIRECTORY",
            Opcode::CalcFileCrc32 => "CALC_FILE_CRC32",
            Opcode::Ack => "ACK",
            Opcode::Nak => "NAK",
        }
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> u8 {
        opcode as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Opcode::None,
            1 => Opcode::TerminateSession,
            2 => Opcode::ResetSessions,
            3 => Opcode::ListDirectory,
            4 => Opcode::OpenFileRo,
            5 => Opcode::ReadFile,
            8 => Opcode::RemoveFile,
            10 => Opcode::RemoveDirectory,
            14 => Opcode::CalcFileCrc32,
            128 => Opcode::Ack,
            129 => Opcode::Nak,
            other => return Err(other),
        })
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Render a raw opcode byte, naming it when it is known
pub fn describe(raw: u8) -> String {
    match Opcode::try_from(raw) {
        Ok(opcode) => opcode.name().to_string(),
        Err(other) => format!("opcode {}", other),
    }
}
