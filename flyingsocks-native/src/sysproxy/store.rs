/// `ERROR_MORE_DATA` as reported by the registry API.
pub const ERROR_MORE_DATA: u32 = 234;

/// Failure of a string query on an opened key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    /// The buffer was too small. `required` is the size the store asked for,
    /// in UTF-16 units including the terminator.
    MoreData { required: usize },
    Os(u32),
}

impl QueryError {
    pub fn code(&self) -> u32 {
        match self {
            QueryError::MoreData { .. } => ERROR_MORE_DATA,
            QueryError::Os(code) => *code,
        }
    }
}

/// Something that can open the Internet Settings key.
///
/// Each call must hand out a fresh key; callers never keep one across
/// operations.
pub trait SettingsStore {
    type Key: SettingsKey;

    fn open(&self) -> Result<Self::Key, u32>;
}

/// An opened Internet Settings key. Dropping it closes the key.
///
/// Errors are raw OS status codes.
pub trait SettingsKey {
    fn get_dword(&self, value: &str) -> Result<u32, u32>;

    fn set_dword(&self, value: &str, data: u32) -> Result<(), u32>;

    /// Read a string value into `buf`, returning the number of UTF-16 units
    /// written including the terminating NUL.
    fn query_string(&self, value: &str, buf: &mut [u16]) -> Result<usize, QueryError>;

    /// Store `data` as a NUL-terminated string value.
    fn set_string(&self, value: &str, data: &str) -> Result<(), u32>;
}
