// Register operation shims. Included into each driver file so that
// `RegisterInterface` resolves to the blocking or async trait of the
// surrounding bisync module.

#[only_sync]
fn read_internal<I, A, R, Acc>(
    op: &mut device_driver::RegisterOperation<'_, I, A, R, Acc>,
) -> Result<R, I::Error>
where
    I: RegisterInterface<AddressType = A>,
    A: Copy,
    R: device_driver::FieldSet,
    Acc: device_driver::ReadCapability,
{
    op.read()
}

#[only_async]
async fn read_internal<I, A, R, Acc>(
    op: &mut device_driver::RegisterOperation<'_, I, A, R, Acc>,
) -> Result<R, I::Error>
where
    I: RegisterInterface<AddressType = A>,
    A: Copy,
    R: device_driver::FieldSet,
    Acc: device_driver::ReadCapability,
{
    op.read_async().await
}

#[only_sync]
fn write_internal<I, A, R, Acc, T>(
    op: &mut device_driver::RegisterOperation<'_, I, A, R, Acc>,
    f: impl FnOnce(&mut R) -> T,
) -> Result<T, I::Error>
where
    I: RegisterInterface<AddressType = A>,
    A: Copy,
    R: device_driver::FieldSet,
    Acc: device_driver::WriteCapability,
{
    op.write(f)
}

#[only_async]
async fn write_internal<I, A, R, Acc, T>(
    op: &mut device_driver::RegisterOperation<'_, I, A, R, Acc>,
    f: impl FnOnce(&mut R) -> T,
) -> Result<T, I::Error>
where
    I: RegisterInterface<AddressType = A>,
    A: Copy,
    R: device_driver::FieldSet,
    Acc: device_driver::WriteCapability,
{
    op.write_async(f).await
}

#[only_sync]
fn modify_internal<I, A, R, Acc, T>(
    op: &mut device_driver::RegisterOperation<'_, I, A, R, Acc>,
    f: impl FnOnce(&mut R) -> T,
) -> Result<T, I::Error>
where
    I: RegisterInterface<AddressType = A>,
    A: Copy,
    R: device_driver::FieldSet,
    Acc: device_driver::ReadCapability + device_driver::WriteCapability,
{
    op.modify(f)
}

#[only_async]
async fn modify_internal<I, A, R, Acc, T>(
    op: &mut device_driver::RegisterOperation<'_, I, A, R, Acc>,
    f: impl FnOnce(&mut R) -> T,
) -> Result<T, I::Error>
where
    I: RegisterInterface<AddressType = A>,
    A: Copy,
    R: device_driver::FieldSet,
    Acc: device_driver::ReadCapability + device_driver::WriteCapability,
{
    op.modify_async(f).await
}
