pub mod protocol;

pub use protocol::{
    ChatMessage, ConnectRequest, ConnectResponse, SendMessageRequest,
    CreateSessionResponse, Route, CREATOR_HEADER,
};
