/// Lifecycle of the single physical connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    ClosingForLogout,
}

/// Events that move a [`ConnectionState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A connection attempt starts
    Connect,
    /// The transport finished opening
    Opened,
    /// The transport could not be opened
    OpenFailed,
    /// The peer or the network dropped an open connection
    Dropped,
    /// A deliberate disconnect was requested
    Logout,
    /// The deliberate close finished
    Closed,
}

impl ConnectionState {
    /// Next state for `transition`, or `None` when it does not apply here.
    pub fn next(self, transition: Transition) -> Option<Self> {
        use ConnectionState::*;
        use Transition::*;

        match (self, transition) {
            (Disconnected, Connect) => Some(Connecting),
            (Connecting, Opened) => Some(Connected),
            (Connecting, OpenFailed) => Some(Disconnected),
            (Connected, Dropped) => Some(Disconnected),
            (_, Logout) => Some(ClosingForLogout),
            (ClosingForLogout, Closed) => Some(Disconnected),
            _ => None,
        }
    }

    /// Open or opening
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}
