use candle_core::Device;

/// Where a pipeline should place its tensors.
#[derive(Debug, Clone, Default)]
pub enum DeviceRequest {
    /// First CUDA device when the build has CUDA support, else CPU.
    #[default]
    Auto,
    Cpu,
    /// CUDA device by ordinal. Fails on builds without CUDA.
    Cuda(usize),
    Explicit(Device),
}

impl DeviceRequest {
    pub fn resolve(self) -> anyhow::Result<Device> {
        let device = match self {
            DeviceRequest::Auto => Device::cuda_if_available(0)?,
            DeviceRequest::Cpu => Device::Cpu,
            DeviceRequest::Cuda(ordinal) => Device::new_cuda(ordinal)?,
            DeviceRequest::Explicit(device) => device,
        };
        tracing::debug!(?device, "resolved device");
        Ok(device)
    }
}

/// Builder methods for choosing a [`DeviceRequest`].
pub trait DeviceSelectable: Sized {
    fn device_request_mut(&mut self) -> &mut DeviceRequest;

    fn cpu(self) -> Self {
        self.with_device_request(DeviceRequest::Cpu)
    }

    fn cuda_device(self, ordinal: usize) -> Self {
        self.with_device_request(DeviceRequest::Cuda(ordinal))
    }

    fn device(self, device: Device) -> Self {
        self.with_device_request(DeviceRequest::Explicit(device))
    }

    fn with_device_request(mut self, request: DeviceRequest) -> Self {
        *self.device_request_mut() = request;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Builder {
        request: DeviceRequest,
    }

    impl DeviceSelectable for Builder {
        fn device_request_mut(&mut self) -> &mut DeviceRequest {
            &mut self.request
        }
    }

    #[test]
    fn test_cpu_and_explicit_requests() -> anyhow::Result<()> {
        assert!(DeviceRequest::Cpu.resolve()?.is_cpu());
        assert!(DeviceRequest::Explicit(Device::Cpu).resolve()?.is_cpu());
        Ok(())
    }

    #[test]
    fn test_builder_methods_replace_request() {
        let builder = Builder::default();
        assert!(matches!(builder.request, DeviceRequest::Auto));

        let builder = builder.cuda_device(1);
        assert!(matches!(builder.request, DeviceRequest::Cuda(1)));

        let builder = builder.cpu();
        assert!(matches!(builder.request, DeviceRequest::Cpu));

        let builder = builder.device(Device::Cpu);
        assert!(matches!(builder.request, DeviceRequest::Explicit(Device::Cpu)));
    }
}
