mod common;
pub use common::{JsonRpcError, Request, Response};

mod http;
pub use http::{ClientError, HttpClientError, Provider as Http};

mod mock;
pub use mock::{MockError, MockRequest, MockTransport};
