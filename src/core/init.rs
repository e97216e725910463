//! Vulkan initialization and startup asset loading.

use std::{path::Path, sync::Arc};

use vulkano::{
  VulkanLibrary,
  buffer::{
    Buffer,
    BufferCreateInfo,
    BufferUsage,
    allocator::{SubbufferAllocator, SubbufferAllocatorCreateInfo},
  },
  command_buffer::{
    AutoCommandBufferBuilder,
    CommandBufferUsage,
    CopyBufferToImageInfo,
    PrimaryCommandBufferAbstract,
    allocator::StandardCommandBufferAllocator,
  },
  descriptor_set::allocator::StandardDescriptorSetAllocator,
  device::{
    Device,
    DeviceCreateInfo,
    DeviceExtensions,
    DeviceFeatures,
    Queue,
    QueueCreateInfo,
    QueueFlags,
    physical::PhysicalDeviceType,
  },
  format::Format,
  image::{
    Image,
    ImageCreateInfo,
    ImageType,
    ImageUsage,
    sampler::{Sampler, SamplerCreateInfo},
    view::ImageView,
  },
  instance::{Instance, InstanceCreateFlags, InstanceCreateInfo},
  memory::allocator::{AllocationCreateInfo, MemoryTypeFilter, StandardMemoryAllocator},
  swapchain::Surface,
  sync::GpuFuture,
};
use winit::event_loop::EventLoop;

use crate::render::model::{MeshBuffers, load_mesh};

/// Meshes and textures for the three drawable objects.
pub struct SceneAssets {
  pub terrain_mesh: MeshBuffers,
  pub drone_mesh: MeshBuffers,
  pub skybox_mesh: MeshBuffers,
  pub terrain_texture: Arc<ImageView>,
  pub drone_texture: Arc<ImageView>,
  pub skybox_texture: Arc<ImageView>,
}

pub struct InitializedVulkan {
  pub instance: Arc<Instance>,
  pub device: Arc<Device>,
  pub queue: Arc<Queue>,
  pub memory_allocator: Arc<StandardMemoryAllocator>,
  pub descriptor_set_allocator: Arc<StandardDescriptorSetAllocator>,
  pub command_buffer_allocator: Arc<StandardCommandBufferAllocator>,
  pub uniform_buffer_allocator: SubbufferAllocator,
  pub assets: SceneAssets,
  pub sampler: Arc<Sampler>,
}

/// Creates the instance/device/queue, the allocators, and uploads every
/// model and texture the simulator draws.
pub fn initialize_vulkan(event_loop: &EventLoop<()>) -> InitializedVulkan {
  let library = VulkanLibrary::new().unwrap();
  let required_extensions = Surface::required_extensions(event_loop).unwrap();
  let instance = Instance::new(
    library,
    InstanceCreateInfo {
      flags: InstanceCreateFlags::ENUMERATE_PORTABILITY,
      enabled_extensions: required_extensions,
      ..Default::default()
    },
  )
  .unwrap();

  let device_extensions = DeviceExtensions {
    khr_swapchain: true,
    ..DeviceExtensions::empty()
  };

  let (physical_device, queue_family_index) = instance
    .enumerate_physical_devices()
    .unwrap()
    .filter(|p| p.supported_extensions().contains(&device_extensions))
    .filter_map(|p| {
      p.queue_family_properties()
        .iter()
        .enumerate()
        .position(|(i, q)| {
          q.queue_flags.intersects(QueueFlags::GRAPHICS)
            && p.presentation_support(i as u32, event_loop).unwrap()
        })
        .map(|i| (p, i as u32))
    })
    .min_by_key(|(p, _)| match p.properties().device_type {
      PhysicalDeviceType::DiscreteGpu => 0,
      PhysicalDeviceType::IntegratedGpu => 1,
      PhysicalDeviceType::VirtualGpu => 2,
      PhysicalDeviceType::Cpu => 3,
      PhysicalDeviceType::Other => 4,
      _ => 5,
    })
    .unwrap();

  println!(
    "Using device: {} (type: {:?})",
    physical_device.properties().device_name,
    physical_device.properties().device_type,
  );

  let (device, mut queues) = Device::new(
    physical_device,
    DeviceCreateInfo {
      enabled_extensions: device_extensions,
      enabled_features: DeviceFeatures {
        #[cfg(target_os = "macos")]
        image_view_format_swizzle: true,
        ..DeviceFeatures::empty()
      },
      queue_create_infos: vec![QueueCreateInfo {
        queue_family_index,
        ..Default::default()
      }],
      ..Default::default()
    },
  )
  .unwrap();

  let queue = queues.next().unwrap();

  let memory_allocator = Arc::new(StandardMemoryAllocator::new_default(device.clone()));
  let descriptor_set_allocator = Arc::new(StandardDescriptorSetAllocator::new(
    device.clone(),
    Default::default(),
  ));
  let command_buffer_allocator = Arc::new(StandardCommandBufferAllocator::new(
    device.clone(),
    Default::default(),
  ));

  let uniform_buffer_allocator = SubbufferAllocator::new(
    memory_allocator.clone(),
    SubbufferAllocatorCreateInfo {
      buffer_usage: BufferUsage::UNIFORM_BUFFER,
      memory_type_filter: MemoryTypeFilter::PREFER_DEVICE | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
      ..Default::default()
    },
  );

  let assets = SceneAssets {
    terrain_mesh: load_mesh(memory_allocator.clone(), "assets/models/mountain.obj"),
    drone_mesh: load_mesh(memory_allocator.clone(), "assets/models/drone.obj"),
    skybox_mesh: load_mesh(memory_allocator.clone(), "assets/models/skybox.obj"),
    terrain_texture: load_texture(
      "assets/textures/mountain.png",
      &memory_allocator,
      &command_buffer_allocator,
      &queue,
    ),
    drone_texture: load_texture(
      "assets/textures/drone.png",
      &memory_allocator,
      &command_buffer_allocator,
      &queue,
    ),
    skybox_texture: load_texture(
      "assets/textures/skybox.png",
      &memory_allocator,
      &command_buffer_allocator,
      &queue,
    ),
  };

  let sampler = Sampler::new(
    device.clone(),
    SamplerCreateInfo {
      mag_filter: vulkano::image::sampler::Filter::Linear,
      min_filter: vulkano::image::sampler::Filter::Linear,
      address_mode: [vulkano::image::sampler::SamplerAddressMode::Repeat; 3],
      ..Default::default()
    },
  )
  .unwrap();

  InitializedVulkan {
    instance,
    device,
    queue,
    memory_allocator,
    descriptor_set_allocator,
    command_buffer_allocator,
    uniform_buffer_allocator,
    assets,
    sampler,
  }
}

/// Decodes a PNG and uploads it to a device-local image via a staging
/// buffer, blocking until the copy completes.
fn load_texture(
  path: impl AsRef<Path>,
  memory_allocator: &Arc<StandardMemoryAllocator>,
  command_buffer_allocator: &Arc<StandardCommandBufferAllocator>,
  queue: &Arc<Queue>,
) -> Arc<ImageView> {
  let texture_data = image::open(path.as_ref()).unwrap().to_rgba8();
  let dimensions = texture_data.dimensions();

  let image = Image::new(
    memory_allocator.clone(),
    ImageCreateInfo {
      image_type: ImageType::Dim2d,
      format: Format::R8G8B8A8_SRGB,
      extent: [dimensions.0, dimensions.1, 1],
      usage: ImageUsage::TRANSFER_DST | ImageUsage::SAMPLED,
      ..Default::default()
    },
    AllocationCreateInfo {
      memory_type_filter: MemoryTypeFilter::PREFER_DEVICE,
      ..Default::default()
    },
  )
  .unwrap();

  let view = ImageView::new_default(image.clone()).unwrap();

  let staging_buffer = Buffer::from_iter(
    memory_allocator.clone(),
    BufferCreateInfo {
      usage: BufferUsage::TRANSFER_SRC,
      ..Default::default()
    },
    AllocationCreateInfo {
      memory_type_filter: MemoryTypeFilter::PREFER_HOST | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
      ..Default::default()
    },
    texture_data.into_raw(),
  )
  .unwrap();

  let mut upload = AutoCommandBufferBuilder::primary(
    command_buffer_allocator.clone(),
    queue.queue_family_index(),
    CommandBufferUsage::OneTimeSubmit,
  )
  .unwrap();

  upload
    .copy_buffer_to_image(CopyBufferToImageInfo::buffer_image(staging_buffer, image))
    .unwrap();

  upload
    .build()
    .unwrap()
    .execute(queue.clone())
    .unwrap()
    .then_signal_fence_and_flush()
    .unwrap()
    .wait(None)
    .unwrap();

  view
}
