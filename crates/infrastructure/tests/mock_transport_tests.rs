use async_trait::async_trait;
use domain::driver::{Sample, Transport, TransportError};
use domain::{
    ConnectionState, DataPoint, DataQuality, DataType, DeviceDriver, DomainError, PointValue,
};
use infrastructure::{DriverOptions, TransportDriver};
use mockall::{Sequence, mock};
use tokio_util::sync::CancellationToken;

mock! {
    pub Link {}

    #[async_trait]
    impl Transport for Link {
        fn kind(&self) -> &str;
        async fn open(&mut self) -> Result<(), TransportError>;
        async fn close(&mut self) -> Result<(), TransportError>;
        async fn read(&mut self, address: &str, data_type: DataType) -> Result<Sample, TransportError>;
        async fn write(&mut self, address: &str, value: &PointValue) -> Result<(), TransportError>;
    }
}

fn link() -> MockLink {
    let mut link = MockLink::new();
    link.expect_kind().return_const("Mock".to_string());
    link
}

async fn connected(link: MockLink) -> TransportDriver<MockLink> {
    let driver = TransportDriver::new("mock-1", link, DriverOptions::default());
    let result = driver.connect(&CancellationToken::new()).await.unwrap();
    assert!(result.is_success());
    driver
}

#[tokio::test]
async fn cancellation_after_first_item_stops_the_batch() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let mut link = link();
    link.expect_open().times(1).returning(|| Ok(()));
    link.expect_read().times(1).returning(move |_, _| {
        trigger.cancel();
        Ok(Sample::new(PointValue::Int16(1), DataQuality::Good))
    });

    let driver = connected(link).await;
    let points = [
        DataPoint::new("p1", "1", DataType::Int16).unwrap(),
        DataPoint::new("p2", "2", DataType::Int16).unwrap(),
        DataPoint::new("p3", "3", DataType::Int16).unwrap(),
    ];

    let result = driver.read_batch(&points, &cancel).await;

    assert_eq!(result.unwrap_err(), DomainError::Cancelled);
    assert_eq!(driver.connection_state(), ConnectionState::Connected);
}

#[tokio::test]
async fn decoded_type_is_checked_against_request() {
    let mut link = link();
    link.expect_open().returning(|| Ok(()));
    link.expect_read()
        .withf(|_, data_type| *data_type == DataType::Int16)
        .returning(|_, _| Ok(Sample::new(PointValue::Int32(70_000), DataQuality::Good)));

    let driver = connected(link).await;
    let result = driver
        .read("40001", DataType::Int16, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        result.error_message(),
        Some("type mismatch at 40001: expected Int16, got Int32")
    );
    assert_eq!(driver.connection_state(), ConnectionState::Connected);
}

#[tokio::test]
async fn write_passes_value_through_unchanged() {
    let mut link = link();
    link.expect_open().returning(|| Ok(()));
    link.expect_write()
        .withf(|_, value| matches!(value, PointValue::Float(v) if *v == 1.5))
        .times(1)
        .returning(|_, _| Ok(()));

    let driver = connected(link).await;
    let result = driver
        .write("40002", PointValue::Float(1.5), &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.is_success());
}

#[tokio::test]
async fn rejected_handshake_releases_transport() {
    let mut seq = Sequence::new();
    let mut link = link();
    link.expect_open()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Err(TransportError::Rejected("bad credentials".to_string())));
    link.expect_close()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));

    let driver = TransportDriver::new("mock-1", link, DriverOptions::default());
    let result = driver.connect(&CancellationToken::new()).await.unwrap();

    assert_eq!(result.error_message(), Some("handshake rejected: bad credentials"));
    assert_eq!(driver.connection_state(), ConnectionState::Faulted);
}

#[tokio::test]
async fn failing_close_still_completes_disconnect() {
    let mut link = link();
    link.expect_open().returning(|| Ok(()));
    link.expect_close()
        .times(1)
        .returning(|| Err(TransportError::DeviceFault("socket busy".to_string())));

    let driver = connected(link).await;
    driver.disconnect(&CancellationToken::new()).await.unwrap();

    assert_eq!(driver.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn non_fatal_errors_keep_the_session() {
    let mut link = link();
    link.expect_open().returning(|| Ok(()));
    link.expect_read()
        .times(2)
        .returning(|address, _| Err(TransportError::InvalidAddress(address.to_string())));

    let driver = connected(link).await;
    let cancel = CancellationToken::new();

    for address in ["x1", "x2"] {
        let result = driver.read(address, DataType::Boolean, &cancel).await.unwrap();
        assert_eq!(
            result.error_message().map(str::to_string),
            Some(format!("invalid address: {address}"))
        );
    }
    assert_eq!(driver.connection_state(), ConnectionState::Connected);
}
